//! Plain-text body files.
//!
//! ```text
//! 2
//! 0 1.0 1.0 1.0 0.0 0.0
//! 1 3.0 1.0 1.0 0.0 0.0
//! ```
//!
//! The first line is the body count `n`, then one `id x y mass vx vy` line
//! per body. Ids must be exactly `0..n`, in any order; bodies come back
//! sorted by id. Output uses tabs and the shortest representation that
//! parses back to the same `f64`, so a written file reloads bit-exactly.
//! Excluded bodies are written with mass `-1`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::error::{Result, SimError};
use crate::simulation::states::{Body, NVec2};

/// Load the initial body array from `path`.
pub fn load_bodies(path: impl AsRef<Path>) -> Result<Vec<Body>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SimError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    let bodies = read_bodies(BufReader::new(file))?;
    debug!("loaded {} bodies from {}", bodies.len(), path.display());
    Ok(bodies)
}

/// Write `bodies` to `path`, replacing whatever was there.
pub fn save_bodies(path: impl AsRef<Path>, bodies: &[Body]) -> Result<()> {
    let path = path.as_ref();
    let save_err = |source| SimError::Save {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(save_err)?;
    let mut writer = BufWriter::new(file);
    write_bodies(&mut writer, bodies).map_err(save_err)?;
    writer.flush().map_err(save_err)?;
    debug!("wrote {} bodies to {}", bodies.len(), path.display());
    Ok(())
}

pub fn read_bodies<R: BufRead>(reader: R) -> Result<Vec<Body>> {
    let mut lines = reader.lines();

    let header = next_line(&mut lines, 1)?;
    let n: usize = header
        .trim()
        .parse()
        .map_err(|e| parse_error(1, format!("bad body count {:?}: {e}", header.trim())))?;

    // grow with the lines actually present, the header alone is not trusted
    let mut read = Vec::new();
    for k in 0..n {
        let line_no = k + 2;
        let line = next_line(&mut lines, line_no)?;
        let body = parse_body(&line, line_no)?;
        if body.id >= n {
            return Err(parse_error(
                line_no,
                format!("id {} out of range for {} bodies", body.id, n),
            ));
        }
        read.push((line_no, body));
    }

    let mut slots: Vec<Option<Body>> = vec![None; read.len()];
    for (line_no, body) in read {
        let slot = &mut slots[body.id];
        if slot.is_some() {
            return Err(parse_error(line_no, format!("duplicate id {}", body.id)));
        }
        *slot = Some(body);
    }

    // n distinct ids in 0..n fill every slot
    Ok(slots.into_iter().flatten().collect())
}

/// Serialise `bodies` in the order given.
pub fn write_bodies<W: Write>(mut writer: W, bodies: &[Body]) -> std::io::Result<()> {
    writeln!(writer, "{}", bodies.len())?;
    for b in bodies {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            b.id,
            b.x.x,
            b.x.y,
            b.file_mass(),
            b.v.x,
            b.v.y
        )?;
    }
    Ok(())
}

fn next_line<I>(lines: &mut I, line_no: usize) -> Result<String>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    match lines.next() {
        Some(Ok(line)) => Ok(line),
        Some(Err(e)) => Err(parse_error(line_no, e.to_string())),
        None => Err(parse_error(line_no, "unexpected end of file".to_string())),
    }
}

fn parse_body(line: &str, line_no: usize) -> Result<Body> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(parse_error(
            line_no,
            format!("expected 6 fields (id x y mass vx vy), found {}", fields.len()),
        ));
    }

    let id: usize = fields[0]
        .parse()
        .map_err(|e| parse_error(line_no, format!("bad id {:?}: {e}", fields[0])))?;
    let mut reals = [0.0f64; 5];
    for (value, field) in reals.iter_mut().zip(&fields[1..]) {
        *value = field
            .parse()
            .map_err(|e| parse_error(line_no, format!("bad number {field:?}: {e}")))?;
    }
    let [x, y, m, vx, vy] = reals;

    Ok(Body::new(id, NVec2::new(x, y), NVec2::new(vx, vy), m))
}

fn parse_error(line: usize, reason: String) -> SimError {
    SimError::Parse { line, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_bodies_sorted_by_id() {
        let text = "3\n2 0.5 0.5 1 0 0\n0 1 1 2 0.1 -0.1\n1 3 1 1 0 0\n";
        let bodies = read_bodies(text.as_bytes()).unwrap();

        let ids: Vec<usize> = bodies.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(bodies[0].m, 2.0);
        assert_eq!(bodies[0].v, NVec2::new(0.1, -0.1));
    }

    #[test]
    fn short_file_reports_missing_line() {
        let err = read_bodies("3\n0 1 1 1 0 0\n".as_bytes()).unwrap_err();
        match err {
            SimError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn huge_header_fails_on_missing_line() {
        for header in ["18446744073709551615", "100000000000000"] {
            let text = format!("{header}\n0 1 1 1 0 0\n");
            let err = read_bodies(text.as_bytes()).unwrap_err();
            assert!(matches!(err, SimError::Parse { line: 3, .. }), "{header}: {err:?}");
        }
    }

    #[test]
    fn non_numeric_header_is_rejected() {
        let err = read_bodies("two\n0 1 1 1 0 0\n".as_bytes()).unwrap_err();
        match err {
            SimError::Parse { line, reason } => {
                assert_eq!(line, 1);
                assert!(reason.contains("bad body count"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn non_numeric_field_is_rejected() {
        let err = read_bodies("2\n0 1 1 1 0 0\n1 3 one 1 0 0\n".as_bytes()).unwrap_err();
        match err {
            SimError::Parse { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("bad number"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }

        let bad_id = read_bodies("1\nx 1 1 1 0 0\n".as_bytes()).unwrap_err();
        assert!(matches!(bad_id, SimError::Parse { line: 2, .. }));
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        let err = read_bodies("1\n0 1 1 1 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SimError::Parse { line: 2, .. }));
    }

    #[test]
    fn duplicate_and_out_of_range_ids_are_rejected() {
        let dup = read_bodies("2\n0 1 1 1 0 0\n0 2 2 1 0 0\n".as_bytes()).unwrap_err();
        assert!(matches!(dup, SimError::Parse { line: 3, .. }));

        let range = read_bodies("1\n5 1 1 1 0 0\n".as_bytes()).unwrap_err();
        assert!(matches!(range, SimError::Parse { line: 2, .. }));
    }

    #[test]
    fn excluded_body_written_with_sentinel_mass() {
        let mut b = Body::new(0, NVec2::new(1.0, 2.0), NVec2::zeros(), 3.0);
        b.exclude();

        let mut out = Vec::new();
        write_bodies(&mut out, &[b]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1\n0\t1\t2\t-1\t0\t0\n");
    }
}

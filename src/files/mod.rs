pub mod body_file;

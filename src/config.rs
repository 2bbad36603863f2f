use std::fmt::Display;
use std::fs;

use serde_json::Value;

use crate::error::{CoocError, Result};

#[derive(Clone, Debug)]
pub struct Params {
    pub mode: String,
    pub vocab_file: String,
    pub cooc_file: String,
    pub input_file: String,
    pub output_file: String,
    pub output_format: String,
    pub top_k: usize,
    pub num_threads: usize,
}

impl Display for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "using parameters:
        mode: {}
        vocab_file: {}
        cooc_file: {}
        input_file: {}
        output_file: {}
        output_format: {}
        top_k: {}
        num_threads: {}",
            self.mode,
            self.vocab_file,
            self.cooc_file,
            self.input_file,
            self.output_file,
            self.output_format,
            self.top_k,
            self.num_threads
        )
    }
}

#[derive(Debug)]
pub struct Config {
    params: Params,
}

impl Config {
    pub fn get_params(&self) -> Params {
        self.params.clone()
    }

    pub fn new(args: &[String]) -> Result<Config> {
        if args.len() != 2 {
            return Err(CoocError::config("input should be a path to a json file only"));
        }

        // parse input json
        let f = fs::File::open(&args[1]).map_err(|e| CoocError::File {
            path: args[1].clone(),
            source: e,
        })?;
        let json: Value = serde_json::from_reader(f)?;

        // the mode decides which of the other keys are required
        let mode = match json.get("mode") {
            Some(mode) => match mode.as_str() {
                Some(mode) => mode.to_owned(),
                None => return Err(CoocError::config("mode is not a string")),
            },
            None => return Err(CoocError::config("mode was not supplied through json")),
        };

        // handle default vs input parameters
        let vocab_file = match json.get("vocab_file") {
            Some(value) => match value.as_str() {
                Some(value) => value.to_owned(),
                None => return Err(CoocError::config("vocab_file is not a string")),
            },
            None => String::new(),
        };
        let cooc_file = match json.get("cooc_file") {
            Some(value) => match value.as_str() {
                Some(value) => value.to_owned(),
                None => return Err(CoocError::config("cooc_file is not a string")),
            },
            None => String::new(),
        };
        let input_file = match json.get("input_file") {
            Some(value) => match value.as_str() {
                Some(value) => value.to_owned(),
                None => return Err(CoocError::config("input_file is not a string")),
            },
            None => "-".to_owned(),
        };
        let output_file = match json.get("output_file") {
            Some(value) => match value.as_str() {
                Some(value) => value.to_owned(),
                None => return Err(CoocError::config("output_file is not a string")),
            },
            None => "-".to_owned(),
        };
        let output_format = match json.get("output_format") {
            Some(value) => match value.as_str() {
                Some(value) => value.to_owned(),
                None => return Err(CoocError::config("output_format is not a string")),
            },
            None => "id".to_owned(),
        };
        let top_k = match json.get("top_k") {
            Some(value) => match value.as_u64() {
                Some(value) => value as usize,
                None => return Err(CoocError::config("top_k is not a non-negative integer")),
            },
            None => 0,
        };
        let num_threads = match json.get("num_threads") {
            Some(value) => match value.as_u64() {
                Some(value) => value as usize,
                None => return Err(CoocError::config("num_threads is not a non-negative integer")),
            },
            None => 0,
        };

        match mode.as_str() {
            "build" => {
                if vocab_file.is_empty() {
                    return Err(CoocError::config("build mode needs a vocab_file"));
                }
                if cooc_file.is_empty() {
                    return Err(CoocError::config("build mode needs a cooc_file"));
                }
            }
            "item2id" | "id2item" => {}
            other => return Err(CoocError::config(format!("unknown mode {:?}", other))),
        }
        if output_format != "id" && output_format != "item" {
            return Err(CoocError::config(format!(
                "unknown output_format {:?}",
                output_format
            )));
        }

        let params = Params {
            mode,
            vocab_file,
            cooc_file,
            input_file,
            output_file,
            output_format,
            top_k,
            num_threads,
        };

        Ok(Self { params })
    }
}

pub mod files_handling {

    use std::fs::File;
    use std::io::{self, BufRead, BufReader, BufWriter, Write};

    use flate2::read::GzDecoder;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    use crate::error::{CoocError, Result};

    /// Open a read endpoint: `-` is stdin, names ending in `.gz` are
    /// decompressed on the fly.
    pub fn open_input(path: &str) -> Result<Box<dyn BufRead>> {
        if path == "-" {
            return Ok(Box::new(BufReader::new(io::stdin())));
        }
        let f = File::open(path).map_err(|e| CoocError::File {
            path: path.to_string(),
            source: e,
        })?;
        if path.ends_with(".gz") {
            Ok(Box::new(BufReader::new(GzDecoder::new(BufReader::new(f)))))
        } else {
            Ok(Box::new(BufReader::new(f)))
        }
    }

    /// Open a write endpoint: `-` is stdout, `.gz` names are compressed.
    /// Callers flush when done; the gzip trailer is written on drop.
    pub fn open_output(path: &str) -> Result<Box<dyn Write>> {
        if path == "-" {
            return Ok(Box::new(io::stdout()));
        }
        let f = File::create(path).map_err(|e| CoocError::File {
            path: path.to_string(),
            source: e,
        })?;
        if path.ends_with(".gz") {
            Ok(Box::new(GzEncoder::new(BufWriter::new(f), Compression::default())))
        } else {
            Ok(Box::new(BufWriter::new(f)))
        }
    }
}

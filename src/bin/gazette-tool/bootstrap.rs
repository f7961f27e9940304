use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::{fs, io};

use regex::Regex;

use crate::decompress::decompress_files;
use crate::BootstrapArgs;

fn get_sample_cfg() -> &'static str {
    let sample_cfg = include_str!("../../../res/gazette.toml");
    sample_cfg
}

fn write_gazette_cfg(out_dir: &Path) -> io::Result<()> {
    let file = File::create(out_dir.join("gazette.toml"))?;
    let mut writer = BufWriter::new(file);

    let sample_cfg = get_sample_cfg();
    let sample_cfg = replace_paths(out_dir, sample_cfg);

    writer.write_all(sample_cfg.as_bytes())?;

    writer.flush()
}

/// The sample config points into res/. A bootstrapped blog gets those paths
/// rewritten to the chosen directory.
fn replace_paths(prefix: &Path, config_data: &str) -> String {
    let prefix = prefix.to_str().unwrap();
    let prefix = if prefix.ends_with("/") {
        prefix[0..prefix.len() - 1].to_string()
    } else {
        prefix.to_string()
    };

    let res_regex = Regex::new(r#"(res)/\w+"#).unwrap();

    let result = res_regex.replace_all(config_data, |captures: &regex::Captures| {
        let src = captures.get(1).unwrap().as_str();
        let prefixed_src = prefix.to_string();
        captures.get(0).unwrap().as_str().replace(src, &prefixed_src)
    });

    result.to_string()
}

pub fn bootstrap_cmd(args: BootstrapArgs) {
    let out_path = PathBuf::from(&args.out_dir);
    let out_path = match fs::canonicalize(out_path) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error converting path to absolute: {} - {}", &args.out_dir, e);
            return;
        }
    };

    if !fs::metadata(&out_path).unwrap().is_dir() {
        eprintln!("Output path must be a directory: {}", out_path.display());
        return;
    }

    if let Err(e) = decompress_files(&out_path) {
        eprintln!("Error bootstrapping: {}", e);
        return;
    };

    if let Err(e) = write_gazette_cfg(&out_path) {
        eprintln!("Error writing Gazette configuration: {}", e);
        return;
    }

    println!("New blog created in {}", out_path.display());
    println!("Start it with: gazette --config-path {}", out_path.join("gazette.toml").display());
}

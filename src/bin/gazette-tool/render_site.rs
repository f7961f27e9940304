use std::path::Path;
use std::process::exit;

use gazette::config::read_config;
use gazette::site_builder::build_site;

use crate::BuildArgs;

pub fn build_cmd(args: BuildArgs) {
    let config = match read_config(Path::new(&args.config_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            exit(2);
        }
    };

    match build_site(&config) {
        Ok(summary) => {
            println!(
                "Built {} posts: {} pages written, {} assets copied into {}",
                summary.posts,
                summary.pages_written,
                summary.assets_copied,
                config.paths.output_dir.display()
            );
        }
        Err(e) => {
            eprintln!("Error building site: {}", e);
            exit(1);
        }
    }
}

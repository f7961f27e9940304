use std::path::Path;
use std::process::exit;

use gazette::checker::{check_posts, has_errors};
use gazette::config::read_config;

use crate::CheckArgs;

pub fn check_cmd(args: CheckArgs) {
    let config = match read_config(Path::new(&args.config_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            exit(2);
        }
    };

    let reports = match check_posts(
        &config.paths.posts_dir,
        config.index_base(),
        Some(&config.paths.template_dir),
    ) {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("Error checking posts: {}", e);
            exit(2);
        }
    };

    let mut clean = 0;
    for report in reports.iter() {
        if report.is_clean() {
            clean += 1;
            continue;
        }
        println!("{}", report.file.display());
        for issue in report.issues.iter() {
            println!("  {}", issue);
        }
    }
    println!("{} posts checked, {} clean", reports.len(), clean);

    if has_errors(&reports) {
        exit(1);
    }
}

use std::fmt::{Display, Formatter};

use clap::{Parser, ValueEnum};

use crate::bootstrap::bootstrap_cmd;
use crate::check::check_cmd;
use crate::new_post::new_cmd;
use crate::render_site::build_cmd;

mod bootstrap;
mod check;
mod decompress;
mod new_post;
mod render_site;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
enum Args {
    /// Create a new post
    New(NewArgs),
    /// Check posts for broken metadata, code blocks and links
    Check(CheckArgs),
    /// Bake the blog into a static site
    Build(BuildArgs),
    /// Bootstrap a new blog
    Bootstrap(BootstrapArgs),
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct NewArgs {
    /// Name of the author. If empty, OS user real name is being used
    #[arg(short, long)]
    name: Option<String>,

    /// Title of the post
    #[arg(short, long)]
    title: Option<String>,

    /// Space separated list of categories
    #[arg(short, long)]
    categories: Option<String>,

    /// Post generation options
    #[arg(short, long, default_value_t = PostOutput::Stdout)]
    output: PostOutput,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct CheckArgs {
    /// Config file of the blog to check
    #[arg(short, long, default_value = "gazette.toml")]
    config_path: String,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct BuildArgs {
    /// Config file of the blog to build
    #[arg(short, long, default_value = "gazette.toml")]
    config_path: String,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct BootstrapArgs {
    /// Directory where the new blog will be generated
    #[arg(short, long)]
    out_dir: String,
}

#[derive(Clone, Debug, ValueEnum)]
enum PostOutput {
    /// Writes the new post content to the stdout
    Stdout,
    /// Writes the new post content to a file (posts without images)
    File,
    /// Writes the new post content to a directory (posts with images)
    Dir,
}

impl Display for PostOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PostOutput::Stdout => "stdout",
            PostOutput::File => "file",
            PostOutput::Dir => "dir",
        };
        write!(f, "{}", name)
    }
}

fn main() {
    let args = Args::parse();

    match args {
        Args::New(args) => new_cmd(args),
        Args::Check(args) => check_cmd(args),
        Args::Build(args) => build_cmd(args),
        Args::Bootstrap(args) => bootstrap_cmd(args),
    };
}

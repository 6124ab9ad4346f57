// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn target_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("force")
            .short('f')
            .long("force")
            .action(ArgAction::SetTrue)
            .help("Overwrite existing files and directories"),
    )
    .arg(
        Arg::new("save_to")
            .short('t')
            .long("save-to")
            .value_name("DIR")
            .help("Directory to unpack into (default: current directory)"),
    )
}

fn build_cli() -> Command {
    Command::new("slurpy")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Slurpy Contributors")
        .about("AUR search, download and update helper")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Configuration file (default: ~/.config/slurpy/config.toml)"),
        )
        .arg(
            Arg::new("color")
                .short('c')
                .long("color")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Colorize output"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Show less information"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Show more information (repeat for debug logging)"),
        )
        .subcommand(target_args(
            Command::new("download")
                .about("Download and unpack package snapshots from the AUR")
                .arg(Arg::new("packages").required(true).num_args(1..).help("Package names"))
                .arg(
                    Arg::new("deps")
                        .short('d')
                        .long("deps")
                        .action(ArgAction::SetTrue)
                        .help("Also download build dependencies found in the AUR"),
                ),
        ))
        .subcommand(
            Command::new("info")
                .about("Show detailed information about packages")
                .arg(Arg::new("packages").required(true).num_args(1..).help("Package names")),
        )
        .subcommand(
            Command::new("search")
                .about("Search the AUR (use ^ and $ to anchor on package names)")
                .arg(Arg::new("queries").required(true).num_args(1..).help("Search terms")),
        )
        .subcommand(target_args(
            Command::new("update")
                .about("Check installed foreign packages for updates in the AUR")
                .arg(
                    Arg::new("download")
                        .short('d')
                        .long("download")
                        .action(ArgAction::Count)
                        .help("Download the updates (twice to include dependencies)"),
                ),
        ))
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("slurpy.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}

use std::fs;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::Shell;

// The CLI definition only needs clap and clap_complete, both available as
// build-dependencies.
#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let Some(out_dir) = std::env::var_os("OUT_DIR") else {
        panic!("OUT_DIR is set by cargo for build scripts");
    };
    let out_dir = Path::new(&out_dir);

    let man_dir = out_dir.join("man");
    let completion_dir = out_dir.join("completions");
    for dir in [&man_dir, &completion_dir] {
        fs::create_dir_all(dir)
            .unwrap_or_else(|e| panic!("cannot create {}: {e}", dir.display()));
    }

    let mut cmd = cli::Cli::command();
    write_manpages(&cmd, &man_dir);

    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
        clap_complete::generate_to(shell, &mut cmd, "aclflow", &completion_dir)
            .unwrap_or_else(|e| panic!("cannot generate {shell} completions: {e}"));
    }
}

/// One page per command, named `aclflow-<sub>-<subsub>.1`.
fn write_manpages(cmd: &clap::Command, dir: &Path) {
    let name = cmd.get_name().to_owned();
    let mut page = Vec::new();
    clap_mangen::Man::new(cmd.clone())
        .render(&mut page)
        .unwrap_or_else(|e| panic!("cannot render man page for `{name}`: {e}"));

    let path = dir.join(format!("{name}.1"));
    fs::write(&path, page).unwrap_or_else(|e| panic!("cannot write {}: {e}", path.display()));

    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        let renamed = sub.clone().name(format!("{name}-{}", sub.get_name()));
        write_manpages(&renamed, dir);
    }
}

const HELP: &str = "gh-trending — Browse GitHub trending repositories from the terminal.\n\n  --configure, -c      Edit the config file in $EDITOR and exit\n  --version,   -V      Show version and exit\n  --help,      -h      Show this help message";

enum Command {
    Run,
    Exit(i32),
}

fn main() {
    match handle_cli_flags() {
        Command::Exit(code) => std::process::exit(code),
        Command::Run => {}
    }

    if let Err(err) = gh_trending::run() {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags() -> Command {
    let mut command = Command::Run;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("gh-trending {}", gh_trending::VERSION);
                command = Command::Exit(0);
            }
            "--help" | "-h" => {
                println!("{HELP}");
                command = Command::Exit(0);
            }
            "--configure" | "-c" => {
                let editor = gh_trending::config::editor_command();
                if let Err(err) = gh_trending::config::edit(None, &editor) {
                    eprintln!("error: {err:?}");
                    return Command::Exit(1);
                }
                command = Command::Exit(0);
            }
            other => {
                eprintln!("error: unknown argument {other:?}\n\n{HELP}");
                return Command::Exit(2);
            }
        }
    }
    command
}

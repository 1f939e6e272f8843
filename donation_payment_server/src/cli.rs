use std::{env, env::VarError};

/// The server has no subcommands. Anything on the command line is a request for help, which gets
/// the readme plus the current (non-secret) environment. Returns `true` when help was shown, so
/// `main` knows to exit instead of starting the server.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Only ever list variables here that cannot hold credentials. API keys and webhook secrets
    // stay out, even masked.
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "DPG_HOST",
        "DPG_PORT",
        "DPG_DATABASE_URL",
        "DPG_SIGNATURE_CHECKS",
        "DPG_CARD_API_URL",
        "DPG_QR_API_URL",
        "DPG_PROVIDER_TIMEOUT_SECS",
        "DPG_QR_SWEEP_INTERVAL_SECS",
        "DPG_QR_SWEEP_GRACE_SECS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}

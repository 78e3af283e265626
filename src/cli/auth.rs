use std::io::{IsTerminal, Read};
use std::path::Path;

use anyhow::Context;

use crate::config::Session;

use super::render::{KeyValueRow, render_output};
use super::{AuthCmd, Cli};

pub(super) fn run_auth(cli: &Cli, token_file: &Path, cmd: AuthCmd) -> anyhow::Result<()> {
    match cmd {
        AuthCmd::Status => {
            let source = if cli.token.as_deref().is_some_and(|t| !t.trim().is_empty()) {
                "env"
            } else if token_file.exists() {
                "file"
            } else {
                "none"
            };
            let session = Session::resolve(cli.token.clone(), token_file);
            render_output(
                cli,
                vec![
                    KeyValueRow::new("token_configured", session.is_signed_in()),
                    KeyValueRow::new("token_source", source),
                    KeyValueRow::new("token_file", token_file.display()),
                    KeyValueRow::new("base_url", &cli.base_url),
                ],
            )
        }
        AuthCmd::SetToken => {
            let token = if std::io::stdin().is_terminal() {
                rpassword::prompt_password("Paste bearer token: ")?
            } else {
                let mut s = String::new();
                std::io::stdin()
                    .read_to_string(&mut s)
                    .context("reading token from stdin")?;
                s
            };
            Session::sign_in(token_file, &token)?;
            render_output(
                cli,
                vec![KeyValueRow::new("token_file", token_file.display())],
            )
        }
        AuthCmd::Logout => {
            Session::sign_out(token_file)?;
            render_output(cli, vec![KeyValueRow::new("signed_out", true)])
        }
    }
}

//! Route resolution as a command.

use anyhow::Result;
use serde::Serialize;

use emon_core::guard::{self, Shell, View};

use crate::app::App;

#[derive(Debug, Serialize)]
struct Resolution {
    requested: String,
    view: String,
    shell: &'static str,
    redirects: Vec<String>,
}

fn shell_name(shell: Shell) -> &'static str {
    match shell {
        Shell::Bare => "none",
        Shell::Standard => "standard",
        Shell::Admin => "admin",
    }
}

fn resolution(requested: &str, view: View, shell: Shell, hops: &[View]) -> Resolution {
    Resolution {
        requested: requested.to_string(),
        view: view.path(),
        shell: shell_name(shell),
        redirects: hops.iter().map(View::path).collect(),
    }
}

pub async fn cmd_open(app: &App, path: &str) -> Result<()> {
    let session = app.restore().await;
    let (view, shell, hops) = guard::land(&session, path);
    let resolved = resolution(path, view, shell, &hops);

    if app.is_json() {
        return app.emit_json(&resolved);
    }
    let mut out = format!("{} -> {} (layout: {})\n", resolved.requested, resolved.view, resolved.shell);
    if !resolved.redirects.is_empty() {
        out.push_str(&format!("redirected via {}\n", resolved.redirects.join(", ")));
    }
    app.emit(&out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_lists_redirects() {
        let r = resolution(
            "/nowhere",
            View::Login,
            Shell::Bare,
            &[View::Dashboard, View::Login],
        );
        assert_eq!(r.view, "/login");
        assert_eq!(r.shell, "none");
        assert_eq!(r.redirects, vec!["/dashboard", "/login"]);
    }
}

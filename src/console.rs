//! Line-oriented front-end: turns typed commands into UI events and render
//! state into text

use std::fmt::Write as _;

use crate::messages::{RenderState, UiEvent};
use crate::models::{HttpMethod, SendStatus};

pub const HELP: &str = "\
tab new | tab close <i> | tab <i>     manage tabs
method <GET|POST|PUT|DELETE|PATCH>   set method
url <url> | query <q> | name <n>     edit the selected tab
headers <text> | headers reset       header lines, `\\n` separates lines
payload <json>                       request body
extract                              move `?query` from the URL to the query field
send | cancel                        send the selected tab / cancel it
save | open <n> | forget <n> | new   saved requests
group save [name] | group add | group <n> | group delete <n> | group clear
login [scope...] | logout            sign in (defaults to the tab's host scope)
show | history | help | quit";

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Event(UiEvent),
    Show,
    History,
    Help,
}

/// Parse one input line; blank lines yield `None`
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let event = match word {
        "tab" => match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
            ["new"] => UiEvent::AddTab,
            ["close", i] => UiEvent::CloseTab(number(i)?),
            [i] => UiEvent::SelectTab(number(i)?),
            _ => return Err(String::from("usage: tab new | tab close <i> | tab <i>")),
        },
        "method" => UiEvent::SetMethod(rest.parse::<HttpMethod>()?),
        "url" => UiEvent::SetUrl(rest.to_string()),
        "query" => UiEvent::SetQuery(rest.to_string()),
        "name" => UiEvent::SetName(rest.to_string()),
        "headers" if rest == "reset" => UiEvent::ResetHeaders,
        "headers" => UiEvent::SetHeaders(rest.replace("\\n", "\n")),
        "payload" => UiEvent::SetPayload(rest.to_string()),
        "extract" => UiEvent::ExtractQuery,
        "send" => UiEvent::SendRequest,
        "cancel" => UiEvent::CancelRequest,
        "save" => UiEvent::SaveRequest,
        "open" => UiEvent::OpenRequest(number(rest)?),
        "forget" => UiEvent::DeleteRequest(number(rest)?),
        "new" => UiEvent::NewRequest,
        "group" => parse_group(rest)?,
        "login" => UiEvent::Login(rest.split_whitespace().map(String::from).collect()),
        "logout" => UiEvent::Logout,
        "quit" | "exit" => UiEvent::Quit,
        "show" => return Ok(Some(ConsoleCommand::Show)),
        "history" => return Ok(Some(ConsoleCommand::History)),
        "help" | "?" => return Ok(Some(ConsoleCommand::Help)),
        other => return Err(format!("unknown command `{}`; try `help`", other)),
    };
    Ok(Some(ConsoleCommand::Event(event)))
}

fn parse_group(rest: &str) -> Result<UiEvent, String> {
    let (word, arg) = match rest.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, arg.trim()),
        None => (rest, ""),
    };
    Ok(match word {
        "save" => UiEvent::SaveGroup(arg.to_string()),
        "add" => UiEvent::AddGroup,
        "delete" => UiEvent::DeleteGroup(number(arg)?),
        "clear" => UiEvent::ClearGroup,
        n => UiEvent::SelectGroup(number(n)?),
    })
}

fn number(text: &str) -> Result<usize, String> {
    text.trim()
        .parse()
        .map_err(|_| format!("expected a number, got `{}`", text.trim()))
}

fn status_marker(status: SendStatus) -> &'static str {
    match status {
        SendStatus::Idle => "",
        SendStatus::Authenticating => " (authenticating)",
        SendStatus::Sending => " (sending)",
    }
}

/// Text view of the workbench: tabs, the selected request and its result
pub fn render(state: &RenderState) -> String {
    let mut out = String::new();

    let tabs: Vec<String> = state
        .tabs
        .iter()
        .map(|t| {
            let current = state.active.as_ref().map(|a| a.index) == Some(t.index);
            format!(
                "{}[{}] {} {}{}",
                if current { "*" } else { " " },
                t.index,
                t.method.as_str(),
                t.label,
                status_marker(t.status)
            )
        })
        .collect();
    let _ = writeln!(out, "Tabs: {}", tabs.join("  "));
    let _ = writeln!(out, "Auth: {}", state.auth.label());

    if !state.groups.is_empty() {
        let groups: Vec<String> = state
            .groups
            .iter()
            .enumerate()
            .map(|(i, g)| {
                let mark = if state.selected_group == Some(i) { "*" } else { "" };
                format!("{}{}:{}", mark, i, g)
            })
            .collect();
        let _ = writeln!(out, "Groups: {}", groups.join("  "));
    }
    for (i, request) in state.requests.iter().enumerate() {
        let mark = if state.selected_request == Some(i) { "*" } else { " " };
        let _ = writeln!(out, "{}{}: {}", mark, i, request);
    }

    if let Some(tab) = &state.active {
        let def = &tab.definition;
        let _ = writeln!(out, "{} {}", def.method.as_str(), def.effective_url());
        if !def.headers.trim().is_empty() {
            for line in def.headers.lines() {
                let _ = writeln!(out, "  {}", line);
            }
        }
        if def.method.has_body() && !def.payload.trim().is_empty() {
            let _ = writeln!(out, "  body: {}", def.payload.trim());
        }

        if let Some(result) = &tab.last_result {
            let status = result
                .status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| String::from("-"));
            let elapsed = result
                .elapsed_ms
                .map(|ms| format!("{} ms", ms))
                .unwrap_or_else(|| String::from("-"));
            let _ = writeln!(out, "Status: {}  Time: {}", status, elapsed);
            let _ = writeln!(out, "{}", result.pretty_body());
        }
    }

    if let Some(notice) = &state.notice {
        let _ = writeln!(out, "! {}", notice);
    }
    out
}

/// Text view of the history log, oldest first
pub fn render_history(state: &RenderState) -> String {
    if state.history.is_empty() {
        return String::from("No requests sent yet\n");
    }
    state
        .history
        .iter()
        .map(|h| {
            format!(
                "{} {:<6} {} (tab {})\n",
                h.sent_at.format("%H:%M:%S"),
                h.method.as_str(),
                h.display_url,
                h.tab_index
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{AuthStatus, TabSummary};
    use crate::models::{RequestDefinition, RequestResult, Tab};

    fn event(line: &str) -> UiEvent {
        match parse_command(line) {
            Ok(Some(ConsoleCommand::Event(event))) => event,
            other => panic!("unexpected parse of {:?}: {:?}", line, other),
        }
    }

    #[test]
    fn test_parse_editing_commands() {
        assert_eq!(event("method post"), UiEvent::SetMethod(HttpMethod::POST));
        assert_eq!(
            event("url https://h/api/x?a=1"),
            UiEvent::SetUrl(String::from("https://h/api/x?a=1"))
        );
        assert_eq!(
            event(r"headers Accept: */*\nX-Trace: 1"),
            UiEvent::SetHeaders(String::from("Accept: */*\nX-Trace: 1"))
        );
        assert_eq!(event("headers reset"), UiEvent::ResetHeaders);
    }

    #[test]
    fn test_parse_tab_and_group_commands() {
        assert_eq!(event("tab new"), UiEvent::AddTab);
        assert_eq!(event("tab close 2"), UiEvent::CloseTab(2));
        assert_eq!(event("tab 1"), UiEvent::SelectTab(1));
        assert_eq!(event("group save nightly"), UiEvent::SaveGroup(String::from("nightly")));
        assert_eq!(event("group save"), UiEvent::SaveGroup(String::new()));
        assert_eq!(event("group 0"), UiEvent::SelectGroup(0));
        assert_eq!(event("group delete 1"), UiEvent::DeleteGroup(1));
    }

    #[test]
    fn test_parse_login_scopes() {
        assert_eq!(event("login"), UiEvent::Login(Vec::new()));
        assert_eq!(
            event("login a b"),
            UiEvent::Login(vec![String::from("a"), String::from("b")])
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("tab close x").is_err());
        assert!(parse_command("method FETCH").is_err());
        assert!(parse_command("frobnicate").is_err());
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn test_render_shows_result() {
        let mut tab = Tab::new(0, RequestDefinition::new(HttpMethod::GET, "https://h/api/x"));
        tab.last_result = Some(RequestResult::completed(200, 12, String::from(r#"{"ok":true}"#)));
        let state = RenderState {
            tabs: vec![TabSummary {
                index: 0,
                label: tab.label(),
                method: HttpMethod::GET,
                status: SendStatus::Idle,
            }],
            active: Some(tab),
            auth: AuthStatus::Authenticated,
            ..Default::default()
        };

        let text = render(&state);
        assert!(text.contains("*[0] GET Request 1"));
        assert!(text.contains("Status: 200  Time: 12 ms"));
        assert!(text.contains("\"ok\": true"));
    }
}

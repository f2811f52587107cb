use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;

pub mod layout;

use crate::app::{App, InputMode, Reading, StatusLevel, Tab};
use crate::domain::Amount;

use self::layout::centered_rect;

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    match app.current_tab {
        Tab::Wallet => draw_wallet(f, areas.main, app),
        Tab::Networks => draw_networks(f, areas.main, app),
    }
    draw_status_line(f, areas.status_line, app);
    draw_command_line(f, areas.command_line, app);

    if app.help_open {
        draw_help_popup(f, areas.size);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .map(|tab| {
            Line::from(vec![
                Span::styled(
                    format!("{}:", tab.shortcut()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(tab.title()),
            ])
        })
        .collect();

    let selected = Tab::ALL
        .iter()
        .position(|t| *t == app.current_tab)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .block(
            Block::default().borders(Borders::ALL).title(Span::styled(
                "WalletScope",
                Style::default()
                    .fg(Color::LightCyan)
                    .add_modifier(Modifier::BOLD),
            )),
        )
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .divider(" │ ");

    f.render_widget(tabs, area);
}

fn draw_wallet(f: &mut Frame, area: Rect, app: &App) {
    let paragraph = Paragraph::new(Text::from(wallet_lines(app)))
        .block(Block::default().borders(Borders::ALL).title("Session"))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn wallet_lines(app: &App) -> Vec<Line<'static>> {
    let state = app.controller.state();
    let Some(address) = state.address() else {
        return vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("● ", Style::default().fg(Color::DarkGray)),
                Span::styled("Not connected", Style::default().fg(Color::LightYellow)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "  Press c (or :connect <address>) to connect a wallet address.",
                Style::default().fg(Color::DarkGray),
            )),
        ];
    };

    let network = app.active_network();
    let network_label = network
        .map(|n| format!("{} (chain {})", n.name, n.id))
        .unwrap_or_else(|| "--".to_string());
    let rpc = network.map(|n| n.rpc_url.clone()).unwrap_or_default();

    let refreshed = match app.last_refreshed {
        Some(at) => at.format("%H:%M:%S").to_string(),
        None if app.is_fetching() => "fetching…".to_string(),
        None => "never".to_string(),
    };

    vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("● ", Style::default().fg(Color::LightGreen)),
            Span::styled("Connected", Style::default().fg(Color::LightGreen)),
        ]),
        Line::from(""),
        field("Address", address.to_string()),
        field("Network", network_label),
        field("RPC", rpc),
        Line::from(""),
        reading_line("Balance", &app.balance, Amount::to_string),
        reading_line("Gas price", &app.gas_price, Amount::to_string),
        reading_line("Block", &app.block_height, |n| format!("#{}", n)),
        Line::from(""),
        field("Refreshed", refreshed),
    ]
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<11}", label), Style::default().fg(Color::DarkGray)),
        Span::raw(value),
    ])
}

fn reading_line<T>(label: &str, reading: &Reading<T>, render: impl Fn(&T) -> String) -> Line<'static> {
    let value = match reading {
        Reading::Idle => Span::styled("--", Style::default().fg(Color::DarkGray)),
        Reading::Loading => Span::styled("loading…", Style::default().fg(Color::Yellow)),
        Reading::Ready(value) => Span::styled(
            render(value),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Reading::Unavailable(reason) => Span::styled(
            format!("unavailable ({})", reason),
            Style::default().fg(Color::LightRed),
        ),
    };
    Line::from(vec![
        Span::styled(format!("  {:<11}", label), Style::default().fg(Color::DarkGray)),
        value,
    ])
}

fn draw_networks(f: &mut Frame, area: Rect, app: &App) {
    let active = app.controller.state().active_network_id();
    let items: Vec<ListItem> = app
        .controller
        .registry()
        .iter()
        .map(|network| {
            let marker = if Some(network.id) == active { "● " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::LightGreen)),
                Span::styled(
                    format!("{:<10}", network.id),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(format!("{:<20}", network.name)),
                Span::styled(
                    format!("{:<7}", network.currency_symbol),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(network.rpc_url.clone(), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Networks ({})", app.controller.registry().len()))
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut state = ListState::default();
    if !app.controller.registry().is_empty() {
        state.select(Some(app.selected_network));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let state = app.controller.state();
    let mut spans = vec![
        Span::styled("Address ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(
            "{}  ",
            state
                .address()
                .map(|a| a.short())
                .unwrap_or_else(|| "--".to_string())
        )),
        Span::styled("Network ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(
            "{}  ",
            app.active_network()
                .map(|n| n.name.clone())
                .unwrap_or_else(|| "--".to_string())
        )),
    ];
    if app.is_fetching() {
        spans.push(Span::styled("fetching…", Style::default().fg(Color::Yellow)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

/// Get command hint for autocompletion
fn command_hint(input: &str) -> Option<&'static str> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }
    let first = input.split_whitespace().next().unwrap_or("");

    let commands = [
        ("connect", "connect <0x address>"),
        ("disconnect", "Forget address and network"),
        ("network", "network <id|name>"),
        ("networks", "List networks"),
        ("add-network", "add-network <id> <rpc> [explorer=..] [symbol=..] <name>"),
        ("wallet", "Wallet view"),
        ("refresh", "Re-fetch balance, gas, block"),
        ("copy", "Copy address"),
        ("explorer", "Copy explorer link"),
        ("export", "Write JSON session report"),
        ("help", "Show help"),
        ("quit", "Quit"),
    ];

    for (cmd, desc) in commands {
        if cmd.starts_with(first) {
            return Some(desc);
        }
    }
    None
}

fn draw_command_line(f: &mut Frame, area: Rect, app: &App) {
    let content = match app.input_mode {
        InputMode::Command => {
            let hint = command_hint(&app.command.input).unwrap_or("Enter=run  Esc=cancel");
            Line::from(vec![
                Span::styled(": ", Style::default().fg(Color::Yellow)),
                Span::raw(app.command.input.clone()),
                Span::styled(format!("  {}", hint), Style::default().fg(Color::DarkGray)),
            ])
        }
        InputMode::Normal => {
            if let Some((text, level)) = app.status_text() {
                let color = match level {
                    StatusLevel::Info => Color::LightGreen,
                    StatusLevel::Warn => Color::LightYellow,
                    StatusLevel::Error => Color::LightRed,
                };
                Line::from(vec![
                    Span::styled("msg: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(text.to_string(), Style::default().fg(color)),
                ])
            } else {
                action_hints(app)
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

fn action_hints(app: &App) -> Line<'static> {
    let hints: &[(&str, &str)] = match (app.current_tab, app.controller.state().is_connected()) {
        (Tab::Networks, _) => &[("Enter", "switch"), ("a", "add"), ("j/k", "move"), (":", "cmd"), ("?", "help")],
        (Tab::Wallet, true) => &[("r", "refresh"), ("y", "copy"), ("d", "disconnect"), ("e", "export"), ("?", "help")],
        (Tab::Wallet, false) => &[("c", "connect"), ("2", "networks"), (":", "cmd"), ("?", "help"), ("q", "quit")],
    };

    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(
            format!("{} ", key),
            Style::default().fg(Color::Yellow),
        ));
        spans.push(Span::styled(
            format!("{}  ", label),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(64, 70, area);
    f.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from("Session"),
        Line::from("  c          Connect (prompt)"),
        Line::from("  d          Disconnect"),
        Line::from("  r          Refresh balance / gas / block"),
        Line::from("  y          Copy address"),
        Line::from("  e          Export session report"),
        Line::from(""),
        Line::from("Networks"),
        Line::from("  Tab / 1-2  Switch tab"),
        Line::from("  j / k      Move selection"),
        Line::from("  Enter      Switch to selected network"),
        Line::from("  a          Add network (prompt)"),
        Line::from(""),
        Line::from("Commands"),
        Line::from("  :connect <addr>    :network <id|name>"),
        Line::from("  :add-network <id> <rpc> [explorer=..] [symbol=..] <name>"),
        Line::from("  :disconnect  :refresh  :copy  :explorer  :export"),
        Line::from(""),
        Line::from("  ?          Toggle help"),
        Line::from("  q          Quit"),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_hint() {
        assert_eq!(command_hint(""), None);
        assert_eq!(command_hint("conn"), Some("connect <0x address>"));
        assert_eq!(command_hint("add-network 1337"), Some("add-network <id> <rpc> [explorer=..] [symbol=..] <name>"));
        assert_eq!(command_hint("zzz"), None);
    }
}

//! Output formatting for text and JSON output.

use std::fmt::Write as _;

use anyhow::Result;
use serde::Serialize;
use tabled::{Table, Tabled};
use time::OffsetDateTime;
use time::macros::format_description;

use emon_core::views::{AdminOverview, HouseView, SensorView};
use emon_types::{
    AdminHouse, Alert, Comparison, House, LiveReading, Sensor, SensorThresholds, UserProfile,
    UserSettings, UserSummary,
};

use crate::cli::StyleMode;
use crate::style;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
    /// Visual styling mode.
    pub style: StyleMode,
}

impl FormatOptions {
    pub fn new(no_color: bool, style: StyleMode) -> Self {
        // Plain mode automatically disables colors for pipe-friendliness
        Self {
            no_color: no_color || style == StyleMode::Plain,
            compact: false,
            style,
        }
    }

    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    pub fn is_rich(&self) -> bool {
        self.style == StyleMode::Rich
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }

    fn table<T: Tabled>(&self, rows: Vec<T>) -> String {
        let mut table = Table::new(rows);
        style::apply_table_style(&mut table, self.style);
        format!("{}\n", table)
    }
}

pub fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_else(|_| ts.to_string())
}

fn format_clock(ts: OffsetDateTime) -> String {
    ts.format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| ts.to_string())
}

fn opt(value: Option<f64>, precision: usize, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.*} {}", precision, v, unit),
        None => "-".to_string(),
    }
}

// ============================================================================
// Houses
// ============================================================================

pub fn format_houses(houses: &[House], opts: &FormatOptions) -> String {
    if houses.is_empty() {
        return "No houses yet. Ask an administrator to assign one to you.\n".to_string();
    }

    #[derive(Tabled)]
    struct SensorRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Sensor")]
        name: String,
        #[tabled(rename = "Location")]
        location: String,
        #[tabled(rename = "Status")]
        status: String,
        #[tabled(rename = "Last power")]
        power: String,
    }

    let mut out = String::new();
    for house in houses {
        let title = format!("{} (#{})", house.name, house.id);
        let _ = writeln!(out, "{}", style::format_header(&title, opts.no_color));
        if !house.address.is_empty() {
            let _ = writeln!(out, "{}", style::format_dim(&house.address, opts.no_color));
        }
        if house.sensors.is_empty() {
            out.push_str("  no sensors\n\n");
            continue;
        }
        let rows: Vec<SensorRow> = house
            .sensors
            .iter()
            .map(|s| SensorRow {
                id: s.id,
                name: s.name.clone(),
                location: s.location.clone().unwrap_or_else(|| "-".to_string()),
                status: style::format_online(s.is_online, opts.no_color),
                power: opt(s.last_reading.as_ref().and_then(|r| r.power), 1, "W"),
            })
            .collect();
        out.push_str(&opts.table(rows));
        out.push('\n');
    }
    out
}

fn comparison_line(label: &str, c: &Comparison, opts: &FormatOptions) -> String {
    format!(
        "  {:<6} {:>10.2} kWh  (previous {:.2} kWh, {})\n",
        label,
        c.current,
        c.previous,
        style::format_change(c.change_percent, opts.no_color)
    )
}

pub fn format_house_view(view: &HouseView, opts: &FormatOptions) -> String {
    let house = &view.house;
    let stats = &view.statistics;
    let mut out = String::new();

    let title = format!("{} (#{})", house.name, house.id);
    let _ = writeln!(out, "{}", style::format_header(&title, opts.no_color));
    if !house.address.is_empty() {
        let _ = writeln!(out, "{}", house.address);
    }
    let _ = writeln!(out, "Price: {:.2} per kWh\n", house.price_per_kwh);

    out.push_str(&style::format_header("Consumption", opts.no_color));
    out.push('\n');
    out.push_str(&comparison_line("Today", &stats.day_comparison, opts));
    out.push_str(&comparison_line("Week", &stats.week_comparison, opts));
    out.push_str(&comparison_line("Month", &stats.month_comparison, opts));

    let p = &stats.prediction;
    out.push('\n');
    out.push_str(&style::format_header("Month forecast", opts.no_color));
    out.push('\n');
    let _ = writeln!(
        out,
        "  {:.2} kWh, cost {:.2} (daily average {:.2} kWh)",
        p.predicted_kwh, p.predicted_cost, p.daily_average
    );

    if !stats.sensor_rankings.is_empty() {
        #[derive(Tabled)]
        struct RankingRow {
            #[tabled(rename = "#")]
            rank: usize,
            #[tabled(rename = "Sensor")]
            name: String,
            #[tabled(rename = "Location")]
            location: String,
            #[tabled(rename = "kWh")]
            kwh: String,
            #[tabled(rename = "Cost")]
            cost: String,
        }

        let rows: Vec<RankingRow> = stats
            .sensor_rankings
            .iter()
            .enumerate()
            .map(|(i, r)| RankingRow {
                rank: i + 1,
                name: r.sensor_name.clone(),
                location: r.location.clone().unwrap_or_else(|| "-".to_string()),
                kwh: format!("{:.2}", r.kwh),
                cost: format!("{:.2}", r.cost),
            })
            .collect();
        out.push('\n');
        out.push_str(&style::format_header("Top consumers", opts.no_color));
        out.push('\n');
        out.push_str(&opts.table(rows));
    }
    out
}

// ============================================================================
// Sensors
// ============================================================================

pub fn format_sensor_view(view: &SensorView, points: usize, opts: &FormatOptions) -> String {
    let s = &view.sensor;
    let mut out = String::new();

    let title = format!("{} (#{})", s.name, s.id);
    let _ = writeln!(
        out,
        "{}  {}",
        style::format_header(&title, opts.no_color),
        style::format_online(s.is_online, opts.no_color)
    );
    if let Some(house) = &s.house {
        let name = house.name().unwrap_or("house");
        let _ = writeln!(out, "House:     {} (#{})", name, house.id());
    }
    if let Some(location) = &s.location {
        let _ = writeln!(out, "Location:  {}", location);
    }
    if !s.description.is_empty() {
        let _ = writeln!(out, "About:     {}", s.description);
    }
    let _ = writeln!(
        out,
        "Limits:    power {}, current {}, voltage {} .. {}, offline after {}",
        opt(s.power_threshold, 0, "W"),
        opt(s.current_max_threshold, 1, "A"),
        opt(s.voltage_min_threshold, 0, "V"),
        opt(s.voltage_max_threshold, 0, "V"),
        s.offline_threshold_seconds
            .map(|secs| format!("{secs} s"))
            .unwrap_or_else(|| "-".to_string()),
    );

    if view.history.is_empty() {
        out.push_str("\nNo history recorded yet.\n");
        return out;
    }

    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Power")]
        power: String,
        #[tabled(rename = "Voltage")]
        voltage: String,
        #[tabled(rename = "Current")]
        current: String,
        #[tabled(rename = "Energy")]
        energy: String,
    }

    let skip = if points == 0 {
        0
    } else {
        view.history.len().saturating_sub(points)
    };
    let rows: Vec<HistoryRow> = view
        .history
        .iter()
        .skip(skip)
        .map(|p| HistoryRow {
            time: format_timestamp(p.timestamp),
            power: opt(p.power, 1, "W"),
            voltage: opt(p.voltage, 1, "V"),
            current: opt(p.current, 2, "A"),
            energy: opt(p.energy, 3, "kWh"),
        })
        .collect();

    let _ = writeln!(
        out,
        "\nHistory ({} of {} points)",
        rows.len(),
        view.history.len()
    );
    out.push_str(&opts.table(rows));
    out
}

pub fn format_thresholds(t: &SensorThresholds) -> String {
    format!(
        "Power:         {}\nCurrent max:   {}\nVoltage min:   {}\nVoltage max:   {}\nOffline after: {}\n",
        opt(t.power_threshold, 0, "W"),
        opt(t.current_max_threshold, 1, "A"),
        opt(t.voltage_min_threshold, 0, "V"),
        opt(t.voltage_max_threshold, 0, "V"),
        t.offline_threshold_seconds
            .map(|secs| format!("{secs} s"))
            .unwrap_or_else(|| "-".to_string()),
    )
}

/// One line per live reading, for `watch`.
pub fn format_live_line(reading: &LiveReading, opts: &FormatOptions) -> String {
    let time = reading
        .timestamp
        .map(format_clock)
        .unwrap_or_else(|| "--:--:--".to_string());
    format!(
        "{}  power {:>10}  voltage {:>8}  current {:>8}  {}\n",
        time,
        opt(reading.power, 1, "W"),
        opt(reading.voltage, 1, "V"),
        opt(reading.current, 2, "A"),
        style::format_online(reading.is_online, opts.no_color)
    )
}

pub fn format_sensors(sensors: &[Sensor], opts: &FormatOptions) -> String {
    if sensors.is_empty() {
        return "No sensors.\n".to_string();
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Sensor")]
        name: String,
        #[tabled(rename = "Device")]
        device: String,
        #[tabled(rename = "House")]
        house: String,
        #[tabled(rename = "Status")]
        status: String,
    }

    let rows: Vec<Row> = sensors
        .iter()
        .map(|s| Row {
            id: s.id,
            name: s.name.clone(),
            device: s.sensor_id.clone().unwrap_or_else(|| "-".to_string()),
            house: s
                .house
                .as_ref()
                .map(|h| h.name().map_or_else(|| format!("#{}", h.id()), str::to_string))
                .unwrap_or_else(|| "-".to_string()),
            status: style::format_online(s.is_online, opts.no_color),
        })
        .collect();
    opts.table(rows)
}

// ============================================================================
// Alerts
// ============================================================================

pub fn format_alerts(alerts: &[Alert], opts: &FormatOptions) -> String {
    if alerts.is_empty() {
        return "No alerts match.\n".to_string();
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "When")]
        when: String,
        #[tabled(rename = "Severity")]
        severity: String,
        #[tabled(rename = "Type")]
        alert_type: String,
        #[tabled(rename = "Where")]
        place: String,
        #[tabled(rename = "Message")]
        message: String,
        #[tabled(rename = "State")]
        state: String,
    }

    let rows: Vec<Row> = alerts
        .iter()
        .map(|a| Row {
            id: a.id,
            when: format_timestamp(a.created_at),
            severity: style::format_severity(a.severity, opts.no_color),
            alert_type: a.alert_type.to_string(),
            place: match &a.sensor_name {
                Some(sensor) => format!("{} / {}", a.house_name, sensor),
                None => a.house_name.clone(),
            },
            message: a.message.clone(),
            state: alert_state(a).to_string(),
        })
        .collect();
    opts.table(rows)
}

fn alert_state(alert: &Alert) -> &'static str {
    match (alert.is_resolved, alert.is_read) {
        (true, _) => "resolved",
        (false, true) => "read",
        (false, false) => "new",
    }
}

// ============================================================================
// Account
// ============================================================================

pub fn format_settings(settings: &UserSettings) -> String {
    format!(
        "Live refresh:     every {} s\nAlert e-mails:    {}\nE-mail frequency: {}\n",
        settings.live_refresh_interval_secs,
        if settings.email_alerts_enabled { "on" } else { "off" },
        settings.alert_frequency
    )
}

pub fn format_profile(
    user: &UserProfile,
    settings: Option<&UserSettings>,
    opts: &FormatOptions,
) -> String {
    let mut out = String::new();
    let role = if user.is_staff { "admin" } else { "user" };
    let _ = writeln!(
        out,
        "{} ({})",
        style::format_header(&user.username, opts.no_color),
        role
    );
    if !user.email.is_empty() {
        let _ = writeln!(out, "E-mail:           {}", user.email);
    }
    if let Some(joined) = user.date_joined {
        let _ = writeln!(out, "Member since:     {}", format_timestamp(joined));
    }
    match settings {
        Some(settings) => out.push_str(&format_settings(settings)),
        None => out.push_str("No settings stored for this account.\n"),
    }
    out
}

// ============================================================================
// Admin
// ============================================================================

pub fn format_admin_overview(overview: &AdminOverview, opts: &FormatOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", style::format_header("Overview", opts.no_color));
    let _ = writeln!(out, "Houses:   {}", overview.houses.len());
    let _ = writeln!(
        out,
        "Sensors:  {} ({} online, {} offline)",
        overview.sensors.len(),
        overview.online_sensors(),
        overview.offline_sensors()
    );
    let _ = writeln!(out, "Users:    {}", overview.users.len());
    out
}

pub fn format_admin_houses(houses: &[AdminHouse], opts: &FormatOptions) -> String {
    if houses.is_empty() {
        return "No houses.\n".to_string();
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "House")]
        name: String,
        #[tabled(rename = "Owner")]
        owner: String,
        #[tabled(rename = "Sensors")]
        sensors: u32,
        #[tabled(rename = "Price/kWh")]
        price: String,
    }

    let rows: Vec<Row> = houses
        .iter()
        .map(|h| Row {
            id: h.id,
            name: h.name.clone(),
            owner: h
                .user
                .as_ref()
                .map(|u| u.username.clone())
                .unwrap_or_else(|| "-".to_string()),
            sensors: h.sensor_count,
            price: format!("{:.2}", h.price_per_kwh),
        })
        .collect();
    opts.table(rows)
}

pub fn format_users(users: &[UserSummary], opts: &FormatOptions) -> String {
    if users.is_empty() {
        return "No users.\n".to_string();
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Username")]
        username: String,
        #[tabled(rename = "E-mail")]
        email: String,
    }

    let rows: Vec<Row> = users
        .iter()
        .map(|u| Row {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
        })
        .collect();
    opts.table(rows)
}

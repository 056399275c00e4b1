//! Self-contained HTML rendering of a [`Report`].

use chrono::{DateTime, Datelike, Utc};

use crate::analyzers::types::{AnomalyRecord, Report};

const STYLE: &str = "body{font-family:Arial,sans-serif;margin:24px;color:#222}\
.card{border:1px solid #ddd;padding:16px;border-radius:10px;margin:12px 0}\
table{width:100%;border-collapse:collapse}\
th,td{border-bottom:1px solid #eee;padding:8px;text-align:left}\
.muted{color:#777;font-size:0.9em}";

/// Renders `report` as a complete HTML document stamped with `generated_at`.
pub fn render_html(report: &Report, generated_at: DateTime<Utc>) -> String {
    let v = &report.vehicle_info;
    let cdc = &report.cdc_data;
    let voltage = &report.anomalies.voltage;
    let temperature = &report.anomalies.temperature;

    let soh = report
        .soh
        .map_or_else(|| "-".to_string(), |soh| format!("{soh:.2}"));

    let vehicle_line = [
        v.make.as_deref(),
        v.model.as_deref(),
        v.year.map(|y| y.to_string()).as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(escape)
    .collect::<Vec<_>>()
    .join(" ");

    let mut html = format!(
        "<!doctype html><html><head><meta charset=\"utf-8\">\
<title>Battery Report {vin}</title><style>{STYLE}</style></head><body>\
<h1>Battery Report</h1>\
<div>Vehicle: <strong>{vin}</strong> {vehicle_line}</div>\
<div class=\"muted\">Design capacity {cap} kWh &middot; nominal {volt} V</div>\
<div class=\"card\"><strong>SoH:</strong> {soh} %</div>\
<div class=\"card\"><h3>Equivalent Full Cycles</h3><table>\
<tr><th>Overall</th><th>Charge</th><th>Discharge</th></tr>\
<tr><td>{overall:.2}</td><td>{charge:.2}</td><td>{discharge:.2}</td></tr>\
</table></div>",
        vin = escape(&v.vin),
        cap = v.design_capacity_kwh,
        volt = v.nominal_pack_voltage,
        overall = cdc.overall_cycles,
        charge = cdc.charge_cycles,
        discharge = cdc.discharge_cycles,
    );

    html.push_str("<div class=\"card\"><h3>Anomalies</h3>");
    anomaly_table(&mut html, "Voltage range", "V", &voltage.voltage_range_anomalies);
    anomaly_table(
        &mut html,
        "Voltage difference",
        "mV",
        &voltage.voltage_difference_anomalies,
    );
    anomaly_table(
        &mut html,
        "Temperature range",
        "&deg;C",
        &temperature.temperature_range_anomalies,
    );
    anomaly_table(
        &mut html,
        "Temperature difference",
        "&deg;C",
        &temperature.temperature_difference_anomalies,
    );
    html.push_str("</div>");

    html.push_str(&format!(
        "<p class=\"muted\">Generated {} &middot; &copy; {}</p></body></html>",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        generated_at.year()
    ));
    html
}

fn anomaly_table(html: &mut String, title: &str, unit: &str, records: &[AnomalyRecord]) {
    html.push_str(&format!("<h4>{title} ({})</h4>", records.len()));
    if records.is_empty() {
        html.push_str("<p class=\"muted\">None detected.</p>");
        return;
    }

    html.push_str(
        "<table><thead><tr><th>Timestamp</th><th>Cells</th><th>Value</th>\
<th>Threshold</th><th>Comment</th></tr></thead><tbody>",
    );
    for r in records {
        let cells = r
            .cells
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{} {unit}</td><td>{} {unit}</td><td>{}</td></tr>",
            r.timestamp.to_rfc3339(),
            if cells.is_empty() { "-".to_string() } else { cells },
            r.value,
            r.threshold,
            escape(&r.comment),
        ));
    }
    html.push_str("</tbody></table>");
}

/// Escapes text for safe interpolation into HTML element content and attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::{
        AnomalyCategory, CycleCounts, VehicleInfo,
    };

    fn report(soh: Option<f64>) -> Report {
        Report {
            vehicle_info: VehicleInfo {
                vin: "<script>VIN".to_string(),
                make: Some("Kia".to_string()),
                model: Some("EV6".to_string()),
                year: Some(2023),
                design_capacity_kwh: 77.4,
                nominal_pack_voltage: 697.0,
            },
            soh,
            cdc_data: CycleCounts {
                overall_cycles: 1.25,
                charge_cycles: 0.75,
                discharge_cycles: 0.5,
            },
            anomalies: Default::default(),
        }
    }

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_740_816_000, 0).unwrap()
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
    }

    #[test]
    fn test_render_escapes_vin() {
        let html = render_html(&report(Some(91.5)), at());
        assert!(html.contains("&lt;script&gt;VIN"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Kia EV6 2023"));
        assert!(html.contains("91.50 %"));
        assert!(html.contains("Generated 2025-03-01 08:00 UTC"));
    }

    #[test]
    fn test_render_document_sections_in_order() {
        let html = render_html(&report(Some(91.5)), at());
        assert!(html.starts_with("<!doctype html>"));
        assert!(html.ends_with("</body></html>"));

        let cycles = html.find("Equivalent Full Cycles").unwrap();
        let anomalies = html.find("<h3>Anomalies</h3>").unwrap();
        let footer = html.find("&copy; 2025").unwrap();
        assert!(cycles < anomalies && anomalies < footer);
        assert!(html.contains("<td>1.25</td><td>0.75</td><td>0.50</td>"));
        assert_eq!(html.matches("<h4>").count(), 4);
    }

    #[test]
    fn test_render_absent_soh() {
        let html = render_html(&report(None), at());
        assert!(html.contains("<strong>SoH:</strong> - %"));
        assert!(html.contains("Voltage range (0)"));
    }

    #[test]
    fn test_render_anomaly_rows() {
        let mut r = report(Some(99.0));
        r.anomalies
            .temperature
            .temperature_difference_anomalies
            .push(AnomalyRecord {
                timestamp: at(),
                category: AnomalyCategory::TemperatureDifference,
                value: 6.0,
                threshold: 5.0,
                cells: vec![],
                comment: "Cell temperature difference too high".to_string(),
            });
        let html = render_html(&r, at());

        assert!(html.contains("Temperature difference (1)"));
        assert!(html.contains("<td>-</td><td>6 &deg;C</td><td>5 &deg;C</td>"));
    }
}

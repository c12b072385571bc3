//! Plain-text/HTML rendering of forecasts for Telegram's `HTML` parse mode.

use std::fmt::Write as _;

use crate::predictions::MatchForecast;

const SEPARATOR: &str = "━━━━━━━━━━━━━━━━━━━━";

fn esc(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

/// Render the recommended forecasts (over 2.5, or confidence ≥ 50) in
/// input order, followed by a total line.
pub fn format_predictions(predictions: &[MatchForecast], is_backup: bool) -> String {
    let mut message = String::from("🔮 <b>PRONÓSTICOS REALES</b> 🔮\n\n");

    if is_backup {
        message.push_str("⚠️ <i>Usando datos de respaldo - API no disponible</i>\n\n");
    }

    let recommended: Vec<&MatchForecast> = predictions.iter().filter(|p| p.is_recommended()).collect();

    if recommended.is_empty() {
        message.push_str("❌ No hay pronósticos recomendados hoy");
        return message;
    }

    for pred in &recommended {
        // Writing to a String cannot fail.
        let _ = write_forecast(&mut message, pred);
    }

    let _ = write!(message, "📋 <b>Total pronósticos: {}</b>", recommended.len());
    message
}

fn write_forecast(out: &mut String, p: &MatchForecast) -> std::fmt::Result {
    writeln!(out, "⚽ <b>{} vs {}</b>", esc(&p.home_team), esc(&p.away_team))?;
    writeln!(out, "🏆 {}", esc(&p.league))?;
    writeln!(out, "🕐 {}, {}\n", esc(&p.match_date), esc(&p.match_time))?;

    writeln!(out, "🏆 <b>Ganador probable:</b> {}\n", esc(p.winner_label()))?;

    writeln!(out, "📊 <b>Probabilidades:</b>")?;
    writeln!(out, "- Victoria local: {}%", p.home_win_prob)?;
    writeln!(out, "- Empate: {}%", p.draw_prob)?;
    writeln!(out, "- Victoria visitante: {}%\n", p.away_win_prob)?;

    if p.is_likely_over25 {
        writeln!(
            out,
            "⚽ <b>Over 2.5 goles:</b> {}% ({:.1} promedio)",
            p.over25_pct, p.avg_goals
        )?;
        writeln!(out, "✅ <b>RECOMENDADO OVER 2.5</b>\n")?;
    }

    writeln!(out, "📈 <b>Confianza:</b> {}%", p.confidence)?;
    writeln!(out, "{SEPARATOR}\n")
}

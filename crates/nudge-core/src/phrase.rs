//! Natural-language rendering of play duration and lateness.
//!
//! These strings become part of the instruction prompt handed to the
//! message generator, so they are written about the player in the third
//! person and end with a trailing space for concatenation.

use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;

/// Elapsed play below this is still "take a break" territory.
const LONG_SESSION_HOURS: i64 = 2;

/// How long the player has been playing, rounded down to the nearest
/// quarter hour, e.g. "over an hour", "over 2 hours and 15 minutes".
/// `None` when they have been playing for less than an hour.
pub fn duration_phrase(game: &str, elapsed: Duration) -> Option<String> {
    let rounded_minutes = elapsed.num_minutes() - elapsed.num_minutes() % 15;
    let hours = rounded_minutes / 60;
    let minutes = rounded_minutes % 60;

    if hours < 1 {
        return None;
    }

    let minutes_part = if minutes > 0 {
        format!(" and {minutes} minutes")
    } else {
        String::new()
    };

    Some(if hours == 1 {
        format!("They have been playing {game} for over an hour{minutes_part}. ")
    } else {
        format!("They have been playing {game} for over {hours} hours{minutes_part}. ")
    })
}

/// How late it is for the player, rounded down to the nearest half hour,
/// e.g. "after 11 PM", "after 12:30 AM", with midnight spelled out. When
/// the player never configured a zone the wording hedges, since the local
/// time is only a guess from the fallback zone.
pub fn lateness_phrase(now: DateTime<Utc>, time_zone: Tz, zone_configured: bool) -> String {
    let local = now.with_timezone(&time_zone);
    let minute = if local.minute() < 30 { 0 } else { 30 };

    let clock = if local.hour() == 0 && minute == 0 {
        "midnight".to_string()
    } else {
        let (is_pm, hour12) = local.hour12();
        let meridiem = if is_pm { "PM" } else { "AM" };
        if minute == 0 {
            format!("{hour12} {meridiem}")
        } else {
            format!("{hour12}:{minute} {meridiem}")
        }
    };

    if zone_configured {
        format!("The player's local time is after {clock}. ")
    } else {
        format!("The player's local time is unknown, but it is believed to be after {clock}. ")
    }
}

/// Build the short instruction the message generator turns into a nudge.
///
/// Past the lateness threshold the nudge asks the player to stop for the
/// night; before that it escalates from "take a break" to "stop for now"
/// once the session crosses two hours.
pub fn nudge_prompt(
    game: &str,
    now: DateTime<Utc>,
    started_at: DateTime<Utc>,
    lateness_threshold: DateTime<Utc>,
    time_zone: Tz,
    zone_configured: bool,
) -> String {
    let elapsed = now - started_at;
    let duration = duration_phrase(game, elapsed).unwrap_or_default();

    if lateness_threshold <= now {
        let lateness = lateness_phrase(now, time_zone, zone_configured);
        return format!(
            "Suggest to the player that they stop playing {game} for the night. {lateness}{duration}"
        );
    }
    if elapsed < Duration::hours(LONG_SESSION_HOURS) {
        return format!("Give the player a reminder to take a break. {duration}");
    }
    format!("Give the player a message suggesting that they stop playing {game} for now. {duration}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Tz;

    fn utc(h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, mi, 0).unwrap()
    }

    #[test]
    fn duration_phrase_under_an_hour_is_omitted() {
        assert_eq!(duration_phrase("Factorio", Duration::minutes(59)), None);
        assert_eq!(duration_phrase("Factorio", Duration::minutes(0)), None);
    }

    #[test]
    fn duration_phrase_rounds_down_to_quarter_hour() {
        assert_eq!(
            duration_phrase("Factorio", Duration::minutes(61)).unwrap(),
            "They have been playing Factorio for over an hour. "
        );
        assert_eq!(
            duration_phrase("Factorio", Duration::minutes(75)).unwrap(),
            "They have been playing Factorio for over an hour and 15 minutes. "
        );
        assert_eq!(
            duration_phrase("Factorio", Duration::minutes(135)).unwrap(),
            "They have been playing Factorio for over 2 hours and 15 minutes. "
        );
        assert_eq!(
            duration_phrase("Factorio", Duration::minutes(240)).unwrap(),
            "They have been playing Factorio for over 4 hours. "
        );
    }

    #[test]
    fn lateness_phrase_rounds_down_to_half_hour() {
        assert_eq!(
            lateness_phrase(utc(23, 5), Tz::UTC, true),
            "The player's local time is after 11 PM. "
        );
        assert_eq!(
            lateness_phrase(utc(0, 40), Tz::UTC, true),
            "The player's local time is after 12:30 AM. "
        );
    }

    #[test]
    fn lateness_phrase_spells_out_midnight() {
        assert_eq!(
            lateness_phrase(utc(0, 10), Tz::UTC, true),
            "The player's local time is after midnight. "
        );
    }

    #[test]
    fn lateness_phrase_hedges_for_fallback_zone() {
        assert_eq!(
            lateness_phrase(utc(23, 45), Tz::UTC, false),
            "The player's local time is unknown, but it is believed to be after 11:30 PM. "
        );
    }

    #[test]
    fn lateness_phrase_converts_to_local_time() {
        // 04:10 UTC is 23:10 the previous evening in New York.
        let tz: Tz = "America/New_York".parse().unwrap();
        assert_eq!(
            lateness_phrase(utc(4, 10), tz, true),
            "The player's local time is after 11 PM. "
        );
    }

    #[test]
    fn prompt_before_threshold_short_session() {
        let prompt = nudge_prompt(
            "Factorio",
            utc(21, 1),
            utc(20, 0),
            utc(23, 0),
            Tz::UTC,
            true,
        );
        assert_eq!(
            prompt,
            "Give the player a reminder to take a break. \
             They have been playing Factorio for over an hour. "
        );
    }

    #[test]
    fn prompt_before_threshold_long_session() {
        let prompt = nudge_prompt(
            "Factorio",
            utc(22, 15),
            utc(20, 0),
            utc(23, 0),
            Tz::UTC,
            true,
        );
        assert_eq!(
            prompt,
            "Give the player a message suggesting that they stop playing Factorio for now. \
             They have been playing Factorio for over 2 hours and 15 minutes. "
        );
    }

    #[test]
    fn prompt_past_threshold_suggests_stopping_for_the_night() {
        let prompt = nudge_prompt(
            "Factorio",
            utc(23, 5),
            utc(22, 0),
            utc(23, 0),
            Tz::UTC,
            true,
        );
        assert_eq!(
            prompt,
            "Suggest to the player that they stop playing Factorio for the night. \
             The player's local time is after 11 PM. \
             They have been playing Factorio for over an hour. "
        );
    }

    #[test]
    fn prompt_past_threshold_under_an_hour_has_no_duration() {
        let prompt = nudge_prompt(
            "Factorio",
            utc(23, 30),
            utc(23, 0),
            utc(23, 0),
            Tz::UTC,
            true,
        );
        assert_eq!(
            prompt,
            "Suggest to the player that they stop playing Factorio for the night. \
             The player's local time is after 11:30 PM. "
        );
    }
}

//! Prompt assembly: the fixed system instruction and the synthetic user
//! message carrying retrieved web context.
//!
//! Both are stamped with today's date — small local models otherwise
//! answer "current" questions from stale training data even when the
//! retrieved context says otherwise.

use chrono::Local;

/// Today's date in prompt form, e.g. `Friday, August 2025`.
pub fn today() -> String {
    Local::now().format("%A, %B %Y").to_string()
}

/// The fixed system instruction prepended to every turn.
pub fn system_instruction() -> String {
    format!(
        "You are a helpful assistant that has web access. \
         Turn the user query into a web engine query, search the web and \
         extract the information. You have access to a web-search tool that \
         lets you search the web for up-to-date information. \
         *IMPORTANT* Today's date is: {}",
        today()
    )
}

/// The synthetic user message appended before the final generation pass,
/// embedding the date, the query the context was gathered for, and the
/// joined context bundle. Empty bundle entries are skipped when joining.
pub fn augmented_context_message(query: &str, bundle: &[String]) -> String {
    let joined = bundle
        .iter()
        .filter(|s| !s.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "*IMPORTANT* Today's date is: {}\n\
         QUERY: {query}\n\
         Up-to-date information gathered from the web for the QUERY:\n\n\
         {joined}\n\n\
         Answer the QUERY using the information above, citing it where helpful.",
        today()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_has_weekday_month_year() {
        let stamp = today();
        // "Friday, August 2025" — two words after the comma, no day number.
        let (weekday, rest) = stamp.split_once(", ").unwrap();
        assert!(!weekday.is_empty());
        assert_eq!(rest.split_whitespace().count(), 2);
        assert!(!stamp.chars().any(|c| c == ':'));
    }

    #[test]
    fn system_instruction_is_date_stamped() {
        let instruction = system_instruction();
        assert!(instruction.contains("web-search tool"));
        assert!(instruction.contains(&today()));
    }

    #[test]
    fn context_message_embeds_query_and_summaries_in_order() {
        let bundle = vec!["first summary".to_string(), "second summary".to_string()];
        let message = augmented_context_message("f1 race", &bundle);
        assert!(message.contains("QUERY: f1 race"));
        let first = message.find("first summary").unwrap();
        let second = message.find("second summary").unwrap();
        assert!(first < second);
    }

    #[test]
    fn context_message_skips_empty_entries() {
        let bundle = vec![String::new(), "only real entry".to_string()];
        let message = augmented_context_message("q", &bundle);
        assert!(message.contains("only real entry"));
        assert!(!message.contains("\n\n\n"));
    }
}

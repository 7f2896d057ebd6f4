//! `sermon-auto feedback`

use std::io::{BufRead, Write};

use chrono::{Local, NaiveDate};

use sermon_engine::{FEEDBACK_QUESTIONS, FeedbackEntry, FeedbackStore, parse_date, run_timestamp};

use crate::cli::prompt::Prompter;
use crate::{Config, SermonError};

/// Ask the feedback questions and store the answers for later manuscripts.
pub(crate) fn execute_feedback_command(date: &str, config: &Config) -> Result<(), SermonError> {
    let sermon_date = parse_date(date)?;

    eprintln!("Feedback for the sermon of {date}. Leave an answer blank to skip it.");
    let entry = collect_answers(sermon_date, &mut Prompter::stdio())?;

    let store = FeedbackStore::new(config.feedback_dir());
    let path = store.record(&entry, &run_timestamp(Local::now()))?;
    println!("Feedback saved: {path}");
    Ok(())
}

fn collect_answers<R: BufRead, W: Write>(
    sermon_date: NaiveDate,
    prompter: &mut Prompter<R, W>,
) -> Result<FeedbackEntry, SermonError> {
    let mut answers: [String; 7] = Default::default();
    for (number, (question, answer)) in FEEDBACK_QUESTIONS.iter().zip(&mut answers).enumerate() {
        *answer = prompter.ask(&format!("{}. {question}", number + 1))?;
    }
    Ok(FeedbackEntry::new(sermon_date, answers))
}

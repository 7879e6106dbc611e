//! Plain-text rendering of phase views and results.

use offload_core::scoring::format_fixed;
use offload_core::stimuli::Condition;
use offload_core::view::{format_clock, PhaseView};
use offload_core::ExperimentResult;

/// Render the current view as the lines to print.
pub fn render_view(view: &PhaseView<'_>) -> Vec<String> {
    match view {
        PhaseView::Intro => vec![
            "[INTRO] You will read 20 trivia statements. Each is marked as either".to_string(),
            "  SAVED to a folder or DELETED. Afterwards your memory is tested in".to_string(),
            "  several ways. Type 'start' to begin.".to_string(),
        ],
        PhaseView::Encoding {
            statement,
            progress,
            can_advance,
        } => {
            let label = match (statement.condition(), statement.folder()) {
                (Condition::Saved, Some(folder)) => format!("SAVED to {folder}"),
                _ => "DELETED".to_string(),
            };
            let mut lines = vec![
                format!("[STATEMENT {}/{}] {}", progress.position, progress.total, statement.text),
                format!("  ({label})"),
            ];
            if *can_advance {
                lines.push("  Type 'next' to continue.".to_string());
            }
            lines
        }
        PhaseView::Distractor {
            problem,
            remaining_seconds,
            answered,
            correct,
        } => vec![format!(
            "[MATH {}] {} = ?   ({correct}/{answered} correct)",
            format_clock(*remaining_seconds),
            problem.text()
        )],
        PhaseView::Recall { draft } => vec![
            "[RECALL] Write down every statement you remember, one per line.".to_string(),
            format!("  {} line(s) so far. Type #done when finished.", draft.lines().count()),
        ],
        PhaseView::Recognition { item, progress } => vec![format!(
            "[RECOGNITION {}/{}] {}   (y = seen, n = new)",
            progress.position, progress.total, item.text
        )],
        PhaseView::Location {
            statement,
            folders,
            progress,
        } => {
            let options: Vec<String> = folders
                .iter()
                .enumerate()
                .map(|(i, f)| format!("{}={f}", i + 1))
                .collect();
            vec![
                format!(
                    "[LOCATION {}/{}] {}",
                    progress.position, progress.total, statement.text
                ),
                format!("  Which folder was it saved in? {}", options.join(" ")),
            ]
        }
        PhaseView::StroopIntro => vec![
            "[COLOR TASK] Words appear in red or blue ink. Name the INK color,".to_string(),
            "  not the word: 'e' for blue, 'i' for red. Answer as fast as you can.".to_string(),
            "  Type 'begin' to start.".to_string(),
        ],
        PhaseView::StroopQuestion {
            block,
            prompt,
            question,
        } => vec![
            format!("[{}] Question {}/{}", block.label(), question.position, question.total),
            format!("  {prompt}   (yes / no / ?)"),
        ],
        PhaseView::StroopTrial {
            block,
            trial,
            progress,
        } => vec![format!(
            "[{} {}/{}] {} in {} ink   (e = blue, i = red)",
            block.label(),
            progress.position,
            progress.total,
            trial.word,
            trial.color.name().to_uppercase()
        )],
        PhaseView::Results { result } => render_result(result),
        PhaseView::Empty { phase } => vec![format!("[{phase}] nothing to show")],
    }
}

/// Render the results summary and its interpretation.
pub fn render_result(result: &ExperimentResult) -> Vec<String> {
    let recall = &result.free_recall;
    let recognition = &result.recognition;
    let location = &result.location_memory;
    let stroop = &result.stroop;
    let interpretation = result.interpretation();

    vec![
        format!("[RESULTS] Participant {}", result.participant_id),
        format!(
            "  Free recall: saved {}/{}, deleted {}/{}, offloading effect {}",
            recall.saved_recalled,
            recall.saved_total,
            recall.deleted_recalled,
            recall.deleted_total,
            format_fixed(recall.offloading_effect, 3)
        ),
        format!(
            "  Recognition: saved hits {}, deleted hits {}, false alarms {}",
            format_fixed(recognition.saved_hit_rate, 3),
            format_fixed(recognition.deleted_hit_rate, 3),
            format_fixed(recognition.false_alarm_rate, 3)
        ),
        format!(
            "  Location memory: {}/{} ({})",
            location.correct,
            location.total,
            format_fixed(location.accuracy, 3)
        ),
        format!(
            "  Stroop: hard {:.0}/{:.0} ms, easy {:.0}/{:.0} ms (tech/neutral), Google effect {} ms",
            stroop.hard.tech_mean_rt,
            stroop.hard.neutral_mean_rt,
            stroop.easy.tech_mean_rt,
            stroop.easy.neutral_mean_rt,
            format_fixed(stroop.google_effect_ms, 1)
        ),
        String::new(),
        format!("  {}", interpretation.offloading),
        format!("  {}", interpretation.interference),
        format!("  {}", interpretation.location),
    ]
}

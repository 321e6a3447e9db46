//! Prompt rendering for the LLM collaborator. Every prompt asks for a single JSON object.

use super::{GenerationRequest, GenerationStage};
use crate::grid::Coord;
use crate::provider::ChatMessage;
use std::fmt::Write;

const SYSTEM_PROMPT: &str = "You are an expert crossword constructor. \
Follow the construction rules exactly. Respond with a single JSON object and nothing else.";

pub fn render(request: &GenerationRequest) -> Vec<ChatMessage> {
    let body = match request.stage {
        GenerationStage::Grid => grid_prompt(request),
        GenerationStage::Fill => fill_prompt(request),
        GenerationStage::Clues => clue_prompt(request),
    };
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(with_feedback(body, &request.constraints.feedback)),
    ]
}

fn grid_prompt(request: &GenerationRequest) -> String {
    let c = &request.constraints;
    let mut prompt = format!(
        "Design a {size} crossword grid layout for the theme \"{theme}\" ({difficulty} difficulty).\n\n\
         Rules:\n\
         - Every word (run of white squares) has at least {min} letters\n\
         - At most {ratio:.0}% of squares are black\n\
         - All white squares are connected\n\
         - Every white square belongs to both an Across and a Down word\n",
        size = request.size,
        theme = request.theme,
        difficulty = request.difficulty,
        min = c.min_word_length,
        ratio = c.max_black_ratio * 100.0,
    );
    if c.require_symmetry {
        prompt.push_str("- The layout has 180-degree rotational symmetry\n");
    }
    if !c.theme_words.is_empty() {
        let _ = write!(
            prompt,
            "\nPlace these theme answers in the grid: {}\n",
            c.theme_words.join(", ")
        );
    }
    prompt.push_str(
        "\nReturn JSON:\n\
         {\"grid_layout\": [[1, 1, 0, ...], ...], \
         \"theme_answers\": [{\"answer\": \"WORD\", \"direction\": \"across\", \"start\": [row, col]}]}\n\
         grid_layout has one row per grid row; 1 is a white square, 0 is black. \
         Coordinates are zero-based.",
    );
    prompt
}

fn fill_prompt(request: &GenerationRequest) -> String {
    let c = &request.constraints;
    let mut prompt = format!(
        "Fill this {size} crossword grid for the theme \"{theme}\".\n\
         '#' is a black square, '.' an empty square, letters are already placed.\n\n",
        size = request.size,
        theme = request.theme,
    );

    if let Some(layout) = &c.layout {
        let mut seeded = layout.clone();
        for answer in &c.theme_answers {
            let _ = seeded.place_answer(answer.start, answer.direction, &answer.text);
        }
        for line in seeded.pattern() {
            let _ = writeln!(prompt, "{}", line);
        }
        prompt.push_str("\nSlots to fill:\n");
        for slot in layout.slots(c.min_word_length) {
            let pattern: String = slot
                .cells()
                .map(|coord| seeded.letter(coord).unwrap_or('.'))
                .collect();
            let _ = writeln!(
                prompt,
                "- {} {} at {} length {} pattern {}",
                slot.number,
                slot.direction,
                format_coord(slot.start),
                slot.length,
                pattern
            );
        }
    }

    prompt.push_str(
        "\nUse real English words and common phrases, no duplicates, and make every \
         crossing letter agree.\n\n\
         Return JSON:\n\
         {\"filled_answers\": [{\"answer\": \"WORD\", \"direction\": \"across\", \"start\": [row, col]}]}\n\
         Include every slot, theme answers included.",
    );
    prompt
}

fn clue_prompt(request: &GenerationRequest) -> String {
    let c = &request.constraints;
    let mut prompt = format!(
        "Write crossword clues for a {difficulty} puzzle on the theme \"{theme}\". \
         Style: {style}.\n\nAnswers:\n",
        difficulty = request.difficulty,
        theme = request.theme,
        style = request.difficulty.clue_style(),
    );
    for answer in &c.answers {
        let _ = writeln!(
            prompt,
            "- {} {}: {}{}",
            answer.number,
            answer.direction,
            answer.text,
            if answer.is_theme { " (theme)" } else { "" }
        );
    }
    prompt.push_str(
        "\nNever use the answer itself in its clue.\n\n\
         Return JSON:\n\
         {\"clues\": [{\"number\": 1, \"direction\": \"across\", \"clue\": \"...\"}]}\n\
         Include exactly one clue per answer.",
    );
    prompt
}

fn with_feedback(mut prompt: String, feedback: &[String]) -> String {
    if feedback.is_empty() {
        return prompt;
    }
    prompt.push_str("\n\nThe previous attempt was rejected:\n");
    for line in feedback {
        let _ = writeln!(prompt, "- {}", line);
    }
    prompt.push_str("Fix these problems.");
    prompt
}

fn format_coord(coord: Coord) -> String {
    format!("[{}, {}]", coord.row, coord.col)
}

use std::fmt::Write;

use reel_core::model::ContentSlide;

pub(super) const SUMMARY_SYSTEM: &str = "You turn study material into one short \
vertical-video slide for a curious teenager. Reply with a single JSON object and \
nothing else, using exactly these string fields: \"title\" (at most 8 words), \
\"intro\" (one hook sentence), \"simpleExplanation\" (two or three plain sentences), \
\"funExample\" (one concrete everyday example).";

pub(super) const QUIZ_SYSTEM: &str = "You write one multiple-choice question that \
checks understanding of the slides you are given. Reply with a single JSON object \
and nothing else, with fields \"question\" (string), \"options\" (array of exactly 4 \
distinct strings), \"correctAnswer\" (0-based index of the right option) and \
\"explanation\" (one sentence on why it is right).";

pub(super) fn summary_request(chunk: &str) -> String {
    format!("Material:\n\n{chunk}")
}

pub(super) fn quiz_request(slides: &[ContentSlide]) -> String {
    let mut request = String::from("Slides:\n");
    for slide in slides {
        let _ = write!(
            request,
            "\n## {}\n{}\n{}\n",
            slide.title(),
            slide.simple_explanation(),
            slide.fun_example()
        );
    }
    request
}

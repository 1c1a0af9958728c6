/// Fixed chain-of-thought template the gateway wraps every question in.
/// The question is substituted verbatim; the model sees nothing else.
pub fn render_question(question: &str) -> String {
    format!("Question: {question}\n\nLet's think step by step\nAnswer:")
}

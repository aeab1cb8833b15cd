//! Static templated answers and the outbound prompt template.
//!
//! The fallback document is intentionally input-independent beyond echoing
//! the query into a single placeholder. That fidelity gap is a documented
//! limitation of the original design, kept as-is rather than silently fixed.

/// Fixed HTML fallback answer, parameterised only by echoing `query` once.
pub fn fallback_response(query: &str) -> String {
    format!(
        r#"
    <p><strong>I'm here to assist you with your health concern:</strong> {query}</p>

    <h3>Possible Causes:</h3>
    <ul>
        <li><strong>Tension or stress</strong></li>
        <li><strong>Dehydration</strong></li>
        <li><strong>Fatigue or lack of sleep</strong></li>
        <li><strong>Infections</strong> (e.g., cold, flu)</li>
        <li><strong>Environmental factors</strong> (e.g., allergens, weather changes)</li>
        <li><strong>Underlying medical conditions</strong> (e.g., chronic conditions)</li>
    </ul>

    <h3>Common Symptoms to Look Out For:</h3>
    <ul>
        <li>How long have you been experiencing these symptoms?</li>
        <li>Do you feel any other related symptoms (e.g., fever, nausea, fatigue)?</li>
    </ul>

    <h3>General Recommendations:</h3>
    <ul>
        <li><strong>Rest:</strong> Take a break and relax in a quiet, dark space.</li>
        <li><strong>Hydrate:</strong> Drink plenty of water or fluids to stay hydrated.</li>
        <li><strong>Healthy Eating:</strong> Try to eat balanced meals with sufficient nutrients.</li>
        <li><strong>Relaxation:</strong> Use relaxation techniques like deep breathing or meditation.</li>
    </ul>

    <p><strong>Disclaimer:</strong> These are general suggestions. Always consult with a healthcare professional for personalized medical advice, diagnosis, or treatment.</p>

    <p>Let me know if you need further assistance or have more specific questions!</p>
    "#
    )
}

/// Compose the user-turn prompt sent to the completion model: rolling
/// context, the current question, and a fixed instructional note.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "\n{context}\nUser: {question}\n\
         Note: The user is seeking help for a medical concern. \
         Please analyze the unique condition mentioned and tailor your advice accordingly.\n"
    )
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_echoes_query_exactly_once() {
        let out = fallback_response("persistent migraine");
        assert_eq!(out.matches("persistent migraine").count(), 1);
        assert!(out.contains("<strong>Disclaimer:</strong>"));
    }

    #[test]
    fn fallback_is_input_independent_otherwise() {
        let a = fallback_response("AAA");
        let b = fallback_response("BBB");
        assert_eq!(a.replace("AAA", ""), b.replace("BBB", ""));
    }

    #[test]
    fn prompt_contains_context_question_and_note() {
        let p = build_prompt("User: hi\nAI: hello", "I have a sore throat");
        assert!(p.contains("User: hi\nAI: hello"));
        assert!(p.contains("User: I have a sore throat"));
        assert!(p.contains("Note: The user is seeking help for a medical concern."));
    }

    #[test]
    fn prompt_with_empty_context_still_has_question() {
        let p = build_prompt("", "fever and chills");
        assert!(p.contains("User: fever and chills"));
    }
}

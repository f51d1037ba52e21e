use engine::analysis::Analyzer;

#[test]
fn it_normalizes_and_stems() {
    let toks = Analyzer::English.analyze("Running Runners RUN! The wing's menu.");
    let words: Vec<String> = toks.into_iter().map(|(w, _)| w).collect();
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    // possessive stripped before stemming
    assert!(words.contains(&"wing".to_string()));
    assert!(!words.iter().any(|w| w.ends_with("'s")));
}

#[test]
fn it_filters_stopwords() {
    let toks = Analyzer::English.analyze("The quick brown fox and the lazy dog");
    let words: Vec<String> = toks.into_iter().map(|(w, _)| w).collect();
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
}

#[test]
fn standard_keeps_stopwords_and_numbers() {
    let toks = Analyzer::standard().analyze("Mach 2.5 and the nozzle");
    let words: Vec<String> = toks.into_iter().map(|(w, _)| w).collect();
    assert_eq!(words, vec!["mach", "2.5", "and", "the", "nozzle"]);
}

#[test]
fn whitespace_preserves_case_and_punctuation() {
    let toks = Analyzer::Whitespace.analyze("Shock-Wave  Interaction.");
    let words: Vec<String> = toks.into_iter().map(|(w, _)| w).collect();
    assert_eq!(words, vec!["Shock-Wave", "Interaction."]);
}

#[test]
fn ngrams_span_whitespace() {
    let toks = Analyzer::ngram(3, 3).unwrap().analyze("a Jet");
    let words: Vec<String> = toks.into_iter().map(|(w, _)| w).collect();
    assert_eq!(words, vec!["a j", " je", "jet"]);
}

#[test]
fn analysis_is_deterministic() {
    let text = "Aeroplane wings' lift and the jet engine's thrust";
    for analyzer in [Analyzer::standard(), Analyzer::English, Analyzer::Synonym, Analyzer::ngram(3, 5).unwrap()] {
        assert_eq!(analyzer.analyze(text), analyzer.analyze(text));
    }
}

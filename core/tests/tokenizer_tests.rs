use telusur_core::analyzer::Analyzer;
use telusur_core::stemmer::stem;
use telusur_core::stopwords::StopwordList;
use telusur_core::tokenizer::tokenize;

#[test]
fn it_lowercases_and_splits() {
    let words = tokenize("Ｊａｋａｒｔａ, 17-08-1945: MERDEKA!").to_vec();
    // fullwidth letters are not ASCII, so they only separate tokens
    assert_eq!(words, vec!["17", "08", "1945", "merdeka"]);
}

#[test]
fn it_filters_stopwords_before_stemming() {
    let analyzer = Analyzer::new(StopwordList::new(["yang", "dan", "pada"]));
    let stems = analyzer.analyze("Yang berjalan dan belajar pada malam hari");
    assert_eq!(stems, vec!["jalan", "ajar", "malam", "hari"]);
}

#[test]
fn documented_stems() {
    assert_eq!(stem("menyapu"), "sapu");
    assert_eq!(stem("pembangunan"), "bangun");
    assert_eq!(stem("berjalan"), "jalan");
    assert_eq!(stem("belajar"), "ajar");
    assert_eq!(stem("kesulitan"), "sulit");
    assert_eq!(stem("buku"), "buku");
}

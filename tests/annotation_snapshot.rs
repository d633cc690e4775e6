use hancard::{annotate, phonetic_line, tokenize};

#[test]
fn mixed_script_phonetic_row() {
    let annotated = annotate(&tokenize("你好world再见"));
    insta::assert_snapshot!(phonetic_line(&annotated), @"nǐ hǎoworldzài jiàn");
}

#[test]
fn plain_chinese_sentence_readings() {
    let annotated = annotate(&tokenize("今天天气很好"));
    insta::assert_snapshot!(phonetic_line(&annotated), @"jīn tiān tiān qì hěn hǎo");
}

mod common;
use common::*;
use taskql_syntax::*;

const SAMPLES: &[&str] = &[
    "",
    "plain words only",
    "#a#b#c",
    "-#x #y!=3 #z? #:w/done #%saved",
    "mail @@bob ##3 #+ lua() #! cmd",
    "  spaced\t\tout  ",
    "ünïcödé #täg €€",
];

#[test]
fn exhaustion_keeps_returning_empty() {
    for sample in SAMPLES {
        let mut tokenizer = Tokenizer::new(sample);
        while !tokenizer.next().is_empty() {}
        for _ in 0..3 {
            assert_eq!(tokenizer.next(), "", "{sample:?}");
        }
    }
}

#[test]
fn rewinding_replays_the_same_tokens() {
    for sample in SAMPLES {
        let total = drain(sample).len();
        for start in 0..=total {
            let mut tokenizer = Tokenizer::new(sample);
            for _ in 0..start {
                tokenizer.next();
            }
            let mark = tokenizer.position();
            let steps = total - start + 1;
            let first: Vec<_> = (0..steps).map(|_| tokenizer.next()).collect();
            tokenizer.rewind(mark);
            let second: Vec<_> = (0..steps).map(|_| tokenizer.next()).collect();
            assert_eq!(first, second, "{sample:?} from {start}");
        }
    }
}

#[test]
fn tokens_cover_the_input_up_to_whitespace() {
    let joined: String = drain("#a=b c@@d").concat();
    assert_eq!(joined, "#a=b c@@d");
}

#[test]
fn no_input_ever_faults() {
    for sample in SAMPLES {
        let mut tokenizer = Tokenizer::new(sample);
        while !tokenizer.next().is_empty() {}
        assert_eq!(tokenizer.fault(), None);
    }
}

//! Minimal chat loop over a handful of authored rules.
//!
//! Run with: cargo run --example chat

use std::io::{self, BufRead, Write};

use riposte::{CondOutput, CondOutputList, Condition, Rule, RuleTree};

fn main() -> io::Result<()> {
    let mut tree = RuleTree::new();

    let rules = vec![
        Rule::new(1, ["hello *", "hi *", "hello"], CondOutputList::from("hi there")),
        Rule::new(
            2,
            ["my name is [name]"],
            CondOutputList::from("nice to meet you [name]"),
        ),
        // `$[q]` re-dispatches the capture through the engine.
        Rule::new(3, ["ask [q]"], CondOutputList::from("they say: $[q]")),
        Rule::new(
            4,
            ["i am [mood]"],
            CondOutputList::new(vec![
                CondOutput::new(
                    Condition::Equals("mood".into(), "happy".into()),
                    "glad to hear it",
                ),
                CondOutput::new(Condition::Always, "why are you [mood]?"),
            ]),
        ),
        Rule::new(5, ["bye", "bye *"], CondOutputList::from("see you")),
    ];
    for rule in &rules {
        tree.add(rule).expect("demo rules lex cleanly");
    }

    let stdin = io::stdin();
    print!("> ");
    io::stdout().flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        match tree.get_response(&line) {
            Some((response, m)) => {
                println!("{response}   [rule {} input {}]", m.rule_id, m.input_idx)
            }
            None => println!("(no matching rule)"),
        }
        print!("> ");
        io::stdout().flush()?;
    }
    Ok(())
}

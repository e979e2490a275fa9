use pest::Parser;
use taep::{Rule, SvgDataParser};

fn main() {
    let inputs = [
        (Rule::path_data, "M 10,20 l 5-5 h10 v-2.5e1 z"),
        (Rule::transform_list, "translate(10 20) rotate(45,5,5) scale(2)"),
    ];

    for (rule, input) in inputs {
        println!("Parsing: {}", input);
        println!();

        match SvgDataParser::parse(rule, input) {
            Ok(pairs) => {
                println!(
                    "{}",
                    pest_ascii_tree::into_ascii_tree(pairs.clone()).unwrap()
                );
            }
            Err(e) => {
                eprintln!("Parse error: {}", e);
            }
        }
    }
}

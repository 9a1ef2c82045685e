use std::path::Path;

use rs_markov_core::generator::Generator;
use rs_markov_core::settings::Settings;
use rs_markov_core::storage::Storage;
use rs_markov_core::storage::json::JsonStorage;

const CORPUS: &str = "\
the cat sat on the mat
the dog sat on the rug
the cat chased the dog
a dog chased a cat";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Log to stderr; verbosity is controlled with RUST_LOG (e.g. RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Build an empty store with backward support enabled, then wrap it in a
    // generator with a context window of 2 tokens
    let storage = JsonStorage::new(Settings::with_backward(true));
    let mut generator = Generator::new(storage, 2)?;

    // Train one chain per corpus line; whitespace tokenization is enough here
    for line in CORPUS.lines() {
        generator.train("body", line.split_whitespace().map(str::to_owned))?;
    }

    // Case-insensitive substring search over the stored state keys
    for state in generator.storage().find_states("body", "CAT")? {
        println!("matching state: {state:?}");
    }

    // Persist the whole store as one JSON document, then reload it.
    // Passing 'None' instead would write the document to standard output.
    let path = Path::new("model.json");
    generator.storage().save(Some(path))?;
    let reloaded = JsonStorage::load(path)?;
    println!("round trip intact: {}", reloaded == *generator.storage());

    // Sample a few forward continuations from an empty context
    for i in 0..5 {
        let tokens = generator.generate("body", &[], 30, false)?;
        println!("generated {}: {}", i + 1, tokens.join(" "));
    }

    // Walk backward from a known ending; the padding tokens that mark the
    // start of a chain come back as empty strings, so filter them out
    let end = ["the".to_owned(), "mat".to_owned()];
    let lead: Vec<String> = generator
        .generate("body", &end, 30, true)?
        .into_iter()
        .filter(|token| !token.is_empty())
        .collect();
    println!("leads into 'the mat': {}", lead.join(" "));

    // Migrate every stored key to a pipe separator; later queries encode
    // with the new separator transparently
    generator.storage_mut().replace_state_separator(" ", "|");
    for state in generator.storage().find_states("body", "cat")? {
        println!("migrated state: {state:?}");
    }

    Ok(())
}

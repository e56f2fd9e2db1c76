use std::thread;

use trigram_core::model::corpus::Corpus;

// Text handed to the corpus must already be cleaned: single spaces between
// words, and nothing outside letters, spaces, commas and full stops.
const HARBOUR_TEXT: &str = "The sun rose over the quiet harbour. \
The boats swayed gently on the tide. The fishermen hauled their nets \
onto the pier. The gulls circled over the boats and cried at the sun. \
The morning market opened beside the pier.";

const FOREST_TEXT: &str = "The path wound through the old forest. \
The trees leaned over the path and hid the sun. The stream crossed \
the path twice before the clearing. The clearing opened onto the \
quiet harbour.";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let corpus = Corpus::new();

    // A generate call on an empty corpus fails with a distinct error
    match corpus.generate(8) {
        Ok(_) => println!("Should not happen"),
        Err(err) => println!("Before ingesting anything: {err}"),
    }

    // The corpus is internally thread-safe: ingest both texts at once.
    // Edges landing on the same bigram from both threads are merged by
    // incrementing weights, never duplicated.
    thread::scope(|scope| {
        scope.spawn(|| corpus.ingest(HARBOUR_TEXT));
        scope.spawn(|| corpus.ingest(FOREST_TEXT));
    });

    println!("Corpus contains {} bigram nodes", corpus.size());

    // Generate a few sentences. Each walk starts from a random bigram
    // whose first word is capitalised, follows edges with probability
    // proportional to how often the transition was seen, and stops on a
    // full stop once the approximate length is reached.
    for i in 0..5 {
        let sentence = corpus.generate(8)?;
        println!("Generated sentence {}: {}", i + 1, sentence.join(" "));
    }

    Ok(())
}

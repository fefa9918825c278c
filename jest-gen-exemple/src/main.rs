use jest_gen_core::{GenError, GenerationInput, Generator, MarkovModel, NaiveBayes, StartSeed};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug shows every training call and accepted sentence
    env_logger::init();

    // Train the classifier from the labeled examples (one sentence per line)
    let mut classifier = NaiveBayes::new();
    classifier.train_from_file("./data/not_funny.txt", false)?;
    classifier.train_from_file("./data/funny.txt", true)?;
    println!(
        "Classifier trained on {} funny and {} not funny sentences",
        classifier.num_funny(),
        classifier.num_not_funny()
    );

    // Load the corpus (one phrase per line)
    // Load automatically data/phrases.bin if existing
    let mut model = MarkovModel::new("./data/phrases.dat")?;

    // The model can keep learning after loading
    model.train("I taught my cat to file taxes");
    println!("Markov model holds {} states", model.len());

    // Every candidate starts with "I"
    // Use 'StartSeed::Random' to pick a random word for each candidate
    let mut input = GenerationInput::new();
    input.start_seed = StartSeed::Custom("I".to_owned());

    // Number of candidates tried before giving up on one sentence
    input.set_nb_try(1000)?;

    // 0 tries is invalid
    match input.set_nb_try(0) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("{e}"),
    }

    let generator = Generator::new(&model, &classifier);

    // Generate 10 sentences using the input settings
    for (i, sentence) in generator.predict_many(&input, 10)?.iter().enumerate() {
        println!("Generated sentence {}: {}", i + 1, sentence);
    }

    // Unknown seeds are reported, not guessed
    match generator.predict(&GenerationInput::with_seed("Zyzzyva")) {
        Err(GenError::UnknownInitialState(word)) => println!("'{word}' is not in the model"),
        Ok(sentence) => println!("Generated: {sentence}"),
        Err(e) => println!("Error: {e}"),
    }

    // Raw model snapshot, e.g. to store it elsewhere
    let json = model.to_json()?;
    println!("Snapshot is {} bytes of JSON", json.len());

    Ok(())
}

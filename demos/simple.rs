use wasserstein_auction::{AuctionParams, AuctionRunner, Labeled};

fn main() {
    // (birth, death) pairs keyed by their position in the original diagrams
    let a = vec![
        Labeled::new(10, [0.0, 1.0]),
        Labeled::new(11, [0.5, 2.0]),
        Labeled::new(12, [1.0, 1.5]),
    ];
    let b = vec![
        Labeled::new(20, [0.1, 1.9]),
        Labeled::new(21, [0.9, 1.4]),
        Labeled::new(22, [0.0, 1.2]),
    ];
    let params = AuctionParams {
        wasserstein_power: 2.0,
        return_matching: true,
        ..Default::default()
    };

    let mut runner = AuctionRunner::new(&a, &b, params).expect("equal-size diagrams");
    let result = runner.run().expect("converges");

    println!(
        "distance: {} (relative error <= {}, {} phases, {} bids)",
        result.distance, result.final_relative_error, result.num_phases, result.num_rounds
    );
    for (bidder, item) in &result.matching {
        println!("{bidder} <-> {item}");
    }
}

use wasserstein_auction::{wasserstein_distance, AuctionParams};

const DIAGRAM_SIZE: usize = 64;
const N: usize = 100;

fn main() {
    let params = AuctionParams {
        wasserstein_power: 2.0,
        verify: false,
        ..Default::default()
    };
    let mut total_distance = 0.;
    for _ in 0..N {
        let a: Vec<_> = (0..DIAGRAM_SIZE)
            .map(|_| nalgebra::Vector2::<f64>::new_random())
            .collect();
        let b: Vec<_> = (0..DIAGRAM_SIZE)
            .map(|_| nalgebra::Vector2::<f64>::new_random())
            .collect();
        total_distance += wasserstein_distance(&a, &b, &params).expect("converges");
    }

    println!("total: {total_distance}");
}

use raffle_ops::error::AppResult;

fn main() -> AppResult<()> {
    raffle_ops::run()
}

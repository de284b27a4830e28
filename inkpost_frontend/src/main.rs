use inkpost_frontend::category;

fn main() -> Result<(), eframe::Error> {
    // An optional category slug (as it appears in share links, e.g.
    // `typescript` or `development`) preselects that filter at startup.
    let initial_category = std::env::args()
        .nth(1)
        .map(|slug| category::slug_to_category(&slug));

    inkpost_frontend::run_frontend(initial_category)
}

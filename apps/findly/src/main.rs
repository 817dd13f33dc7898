//! # Findly CLI
//!
//! Headless front end over the same state holders a UI shell uses. The token
//! is kept in the file store, so a login survives between invocations.
//!
//! ## Usage
//! ```bash
//! findly search Kobzar
//! findly offers 6f1c2a --asc
//! findly login reader hunter2
//! findly favorites
//! findly whoami
//! findly logout
//!
//! # Point at another server
//! FINDLY_API_URL=http://localhost:5132/api/ findly search Eneida
//! findly --config ./findly.toml search Eneida
//! ```

use std::env;
use std::path::PathBuf;

use findly::{init_tracing, App};
use findly_client::ClientConfig;
use findly_core::PriceOrder;

const USAGE: &str = "\
Findly book price comparison

Usage: findly [OPTIONS] <COMMAND>

Commands:
  search <TITLE>...         Search the catalog by title
  offers <BOOK_ID> [--asc]  List shop offers for a book (most expensive first)
  login <LOGIN> <PASSWORD>  Sign in and remember the token
  logout                    Forget the stored token
  favorites                 List liked offers (requires login)
  whoami                    Show the signed-in user

Options:
  -c, --config <PATH>  Config file (default: platform config dir)
  -h, --help           Show this help message";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();

    let mut config_path: Option<PathBuf> = None;
    let mut command: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ => command.push(args[i].clone()),
        }
        i += 1;
    }

    let config = ClientConfig::load_or_default(config_path);
    let app = App::from_config(config)?;

    let Some((name, rest)) = command.split_first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    match name.as_str() {
        "search" => search(&app, &rest.join(" ")).await?,
        "offers" => match rest.first() {
            Some(book_id) => {
                let ascending = rest.iter().any(|a| a == "--asc");
                offers(&app, book_id, ascending).await?;
            }
            None => return Err("usage: findly offers <BOOK_ID> [--asc]".into()),
        },
        "login" => match rest {
            [login, password] => {
                app.account.login(login, password).await?;
                println!("✓ Signed in as {}", app.session.login_name());
            }
            _ => return Err("usage: findly login <LOGIN> <PASSWORD>".into()),
        },
        "logout" => {
            app.account.logout();
            println!("✓ Signed out");
        }
        "favorites" => favorites(&app).await?,
        "whoami" => {
            if app.session.is_authenticated() {
                let user_id = app.session.user_id().unwrap_or_default();
                println!("{} ({})", app.session.login_name(), user_id);
            } else {
                println!("Not signed in");
            }
        }
        other => return Err(format!("unknown command '{}', see --help", other).into()),
    }

    Ok(())
}

async fn search(app: &App, title: &str) -> Result<(), Box<dyn std::error::Error>> {
    app.catalog.set_title(title).await;
    let view = app.catalog.snapshot();

    if let Some(error) = view.error {
        return Err(error.into());
    }
    if view.books.is_empty() {
        println!("No books found");
        return Ok(());
    }

    for book in &view.books {
        let prices = match (book.min_price, book.max_price) {
            (Some(min), Some(max)) if min != max => format!("{} - {}", min, max),
            (Some(min), _) => min.to_string(),
            _ => "-".to_string(),
        };
        let availability = if book.is_available { "" } else { " (unavailable)" };
        println!(
            "{}  {} / {}  [{}]{}",
            book.id,
            book.title,
            book.authors.join(", "),
            prices,
            availability
        );
    }
    Ok(())
}

async fn offers(
    app: &App,
    book_id: &str,
    ascending: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut offers = app.api.offers_for_book(book_id).await?;
    let order = if ascending {
        PriceOrder::Ascending
    } else {
        PriceOrder::Descending
    };
    order.sort(&mut offers);

    if offers.is_empty() {
        println!("No offers");
    }
    for offer in &offers {
        let mut flags = String::new();
        if offer.is_liked {
            flags.push('♥');
        }
        if offer.is_price_set {
            flags.push('🔔');
        }
        let availability = if offer.is_available { "" } else { " (out of stock)" };
        println!(
            "{:>10}  {}{} {}  {}",
            offer.price.to_string(),
            offer.shop_name,
            availability,
            flags,
            offer.link
        );
    }
    Ok(())
}

async fn favorites(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    if !app.session.is_authenticated() {
        return Err(findly::error::UiError::auth_required().into());
    }

    app.favorites.load().await;
    let view = app.favorites.snapshot();
    if let Some(error) = view.error {
        return Err(error.into());
    }
    if view.favorites.is_empty() {
        println!("No favorites yet");
    }
    for favorite in &view.favorites {
        let bell = if favorite.is_notify_set { " 🔔" } else { "" };
        println!(
            "{}  {} @ {}  {}{}",
            favorite.offer_id, favorite.book_title, favorite.shop_name, favorite.current_price, bell
        );
    }
    Ok(())
}

use insighttrack_core::storefront::{CATALOG, FEATURED_PRODUCT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Home,
    Products,
    Hero,
    Collection(u32),
    View(String),
    Add(Option<String>),
    Wishlist,
    Related(u32),
    Cart,
    Checkout,
    Pay,
    Back,
    Log,
    Stats,
    Clear,
    Insight,
    Help,
    Quit,
}

pub const HELP: &str = "\
Storefront
  home                 go to the home page
  products             go to the product list
  hero                 click the \"Shop Now\" banner
  collection <n>       open featured collection n
  view <product>       open a product page
  add [product]        add a product to the cart (defaults to the open product)
  wishlist             add the open product to the wishlist
  related <n>          click related product n
  cart                 open the cart
  checkout             proceed to checkout
  pay                  complete the purchase
  back                 back to the product list

Analytics
  log                  show the live event stream
  stats                show the dashboard
  clear                clear all events
  insight              generate the AI insight report

  help                 show this help
  quit                 exit";

/// Resolve a product by case-insensitive prefix of its catalog name.
pub fn find_product(query: &str) -> Option<&'static str> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }
    CATALOG
        .iter()
        .copied()
        .find(|name| name.to_lowercase().starts_with(&query))
}

fn parse_number(arg: Option<&str>, command: &str) -> Result<u32, String> {
    arg.ok_or_else(|| format!("usage: {} <n>", command))?
        .parse::<u32>()
        .map_err(|_| format!("{}: expected a number", command))
}

pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, Some(rest.trim())),
        None => (line, None),
    };
    let rest = rest.filter(|r| !r.is_empty());

    let command = match word.to_lowercase().as_str() {
        "home" => Command::Home,
        "products" | "shop" => Command::Products,
        "hero" => Command::Hero,
        "collection" => Command::Collection(parse_number(rest, "collection")?),
        "view" => {
            let query = rest.unwrap_or(FEATURED_PRODUCT);
            let product =
                find_product(query).ok_or_else(|| format!("unknown product: {}", query))?;
            Command::View(product.to_string())
        }
        "add" => match rest {
            Some(query) => {
                let product =
                    find_product(query).ok_or_else(|| format!("unknown product: {}", query))?;
                Command::Add(Some(product.to_string()))
            }
            None => Command::Add(None),
        },
        "wishlist" => Command::Wishlist,
        "related" => Command::Related(parse_number(rest, "related")?),
        "cart" => Command::Cart,
        "checkout" => Command::Checkout,
        "pay" | "purchase" => Command::Pay,
        "back" => Command::Back,
        "log" => Command::Log,
        "stats" | "dashboard" => Command::Stats,
        "clear" => Command::Clear,
        "insight" | "report" => Command::Insight,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {} (try 'help')", other)),
    };

    Ok(Some(command))
}

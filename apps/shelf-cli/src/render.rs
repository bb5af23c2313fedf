//! Plain-text rendering of the view models.

use std::fmt::Write;

use shelf_core::catalog::CatalogView;
use shelf_core::detail::{CartControl, CommentBox, DetailState};
use shelf_core::{CartLine, CartTotals, Category};

pub(crate) fn catalog(view: &CatalogView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.heading);
    if view.loading {
        let _ = writeln!(out, "(loading...)");
    }
    if let Some(message) = &view.message {
        let _ = writeln!(out, "{}", message);
        return out;
    }

    for card in &view.items {
        let stock = match card.quantity {
            Some(q) => format!("{} available", q),
            None => "in stock".to_string(),
        };
        let _ = writeln!(
            out,
            "  [{}] {} - {} ({}) {}",
            card.id, card.name, card.price, stock, card.image
        );
    }
    out
}

pub(crate) fn detail(state: &DetailState) -> String {
    let page = match state.page() {
        Some(page) => page,
        None => return state.status_line().unwrap_or_default(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", page.name);
    if !page.author.is_empty() {
        let _ = writeln!(out, "by {}", page.author);
    }
    let _ = writeln!(out, "Category: {}", page.category);
    let _ = writeln!(out, "Condition: {}", page.condition);
    let _ = writeln!(out, "Price: {}", page.price);
    let _ = writeln!(out, "Image: {}", page.image);
    let _ = writeln!(out, "Posted by: {}", page.posted_by);

    if let CartControl::LoginPrompt { message } = &page.cart_control {
        let _ = writeln!(out, "{}", message);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Comments:");
    match page.comments_message() {
        Some(message) => {
            let _ = writeln!(out, "  {}", message);
        }
        None => {
            for comment in &page.comments {
                let _ = writeln!(out, "  {}: {}", comment.author, comment.body);
            }
        }
    }

    if let CommentBox::LoginPrompt { message } = &page.comment_box {
        let _ = writeln!(out, "{}", message);
    }
    out
}

pub(crate) fn cart(lines: &[CartLine], totals: &CartTotals, open: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Cart ({})", if open { "open" } else { "closed" });
    if lines.is_empty() {
        let _ = writeln!(out, "  Your cart is empty.");
        return out;
    }

    for line in lines {
        let _ = writeln!(
            out,
            "  [{}] {} x{} @ {} = {}",
            line.id,
            line.name,
            line.purchase_quantity,
            line.price,
            line.line_total()
        );
    }
    let _ = writeln!(
        out,
        "Items: {}  Subtotal: {}",
        totals.total_quantity, totals.subtotal
    );
    out
}

pub(crate) fn categories(categories: &[Category]) -> String {
    let mut out = String::new();
    for category in categories {
        let _ = writeln!(out, "  [{}] {}", category.id, category.name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_core::catalog::{render_catalog, OUT_OF_STOCK_MESSAGE};
    use shelf_core::detail::{COMMENT_LOGIN_PROMPT, NO_COMMENTS_MESSAGE, NO_DATA_MESSAGE};
    use shelf_core::{Book, Comment, Money, UserRef, PLACEHOLDER_IMAGE};

    #[test]
    fn test_catalog_lists_cards() {
        let books = vec![
            Book::new("b1", "Dune", Money::from_cents(1250)).with_quantity(2),
            Book::new("b2", "Emma", Money::from_cents(600)).with_image("emma.jpg"),
        ];
        let text = catalog(&render_catalog(&books, None, false));

        assert!(text.starts_with("Our Books:"));
        assert!(text.contains("[b1] Dune - $12.50 (2 available) no-image.jpg"));
        assert!(text.contains("[b2] Emma - $6.00 (in stock) emma.jpg"));
    }

    #[test]
    fn test_empty_catalog_prints_message() {
        let text = catalog(&render_catalog(&[], Some(&[][..]), false));
        assert!(text.contains(OUT_OF_STOCK_MESSAGE));
    }

    #[test]
    fn test_detail_page() {
        let book = Book::new("b1", "Dune", Money::from_cents(999))
            .with_owner(UserRef::named("Ada", "Lovelace"))
            .with_comment(Comment::new("Loved it", None));
        let text = detail(&DetailState::ready(&book, true));

        assert!(text.contains("Category: Unknown"));
        assert!(text.contains("Price: $9.99"));
        assert!(text.contains("Posted by: Ada Lovelace"));
        assert!(text.contains(&format!("Image: {}", PLACEHOLDER_IMAGE)));
        assert!(text.contains("  Anonymous: Loved it"));
        assert!(!text.contains("Please log in"));
    }

    #[test]
    fn test_detail_logged_out_and_statuses() {
        let book = Book::new("b1", "Dune", Money::from_cents(999));
        let text = detail(&DetailState::ready(&book, false));
        assert!(text.contains(NO_COMMENTS_MESSAGE));
        assert!(text.contains(COMMENT_LOGIN_PROMPT));
        assert!(text.contains("** Please log in to add to your cart. **"));

        assert_eq!(detail(&DetailState::NoData), NO_DATA_MESSAGE);
        assert_eq!(detail(&DetailState::failed("boom")), "Error: boom");
    }

    #[test]
    fn test_cart_totals() {
        let lines = vec![
            CartLine::from_book(&Book::new("a", "A", Money::from_cents(250))).with_purchase_quantity(2),
            CartLine::from_book(&Book::new("b", "B", Money::from_cents(1000))),
        ];
        let totals = CartTotals::from(lines.as_slice());
        let text = cart(&lines, &totals, true);

        assert!(text.starts_with("Cart (open)"));
        assert!(text.contains("[a] A x2 @ $2.50 = $5.00"));
        assert!(text.contains("Items: 3  Subtotal: $15.00"));

        assert!(cart(&[], &CartTotals::from(&[][..]), false).contains("empty"));
    }
}

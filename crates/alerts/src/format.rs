//! Notification message formatting (Telegram HTML).

use giftwatch_core::{Listing, Marketplace, Ton};

/// Marketplace sale fee rates in basis points, used to show estimated
/// net proceeds next to a listing price.
#[derive(Debug, Clone, Copy)]
pub struct FeeRates {
    pub portal_bps: u32,
    pub mrkt_bps: u32,
}

impl Default for FeeRates {
    fn default() -> Self {
        Self {
            portal_bps: 500,
            mrkt_bps: 500,
        }
    }
}

impl FeeRates {
    pub fn for_marketplace(&self, marketplace: Marketplace) -> u32 {
        match marketplace {
            Marketplace::Portal => self.portal_bps,
            Marketplace::Mrkt => self.mrkt_bps,
        }
    }
}

fn attributes_line(listing: &Listing) -> String {
    match (&listing.model, &listing.backdrop) {
        (Some(m), Some(b)) => format!(" ({m} / {b})"),
        (Some(m), None) => format!(" ({m})"),
        (None, Some(b)) => format!(" ({b})"),
        (None, None) => String::new(),
    }
}

/// Cheap-lot hit message.
pub fn format_cheap_lot(listing: &Listing, fees: &FeeRates) -> String {
    let fee_bps = fees.for_marketplace(listing.id.marketplace);
    let net = listing.price.after_fee_bps(fee_bps);
    format!(
        "🎁 Cheap lot: <b>{}</b>{}\n\
         Price: <b>{}</b> on {}\n\
         Resale net of fee: {}\n\
         <code>{}</code>",
        listing.gift,
        attributes_line(listing),
        listing.price,
        listing.id.marketplace,
        net,
        listing.id,
    )
}

/// Subscription floor-change message.
pub fn format_floor_change(
    num: usize,
    gift: &str,
    old_floor: Option<Ton>,
    new_floor: Ton,
    fresh_matches: usize,
) -> String {
    let movement = match old_floor {
        Some(old) if new_floor < old => format!("{old} → <b>{new_floor}</b> 📉"),
        Some(old) if new_floor > old => format!("{old} → <b>{new_floor}</b> 📈"),
        Some(_) => format!("<b>{new_floor}</b>"),
        None => format!("<b>{new_floor}</b> (first sighting)"),
    };
    format!(
        "🔔 Subscription #{num} <b>{gift}</b>\n\
         Floor: {movement}\n\
         New matching listings: {fresh_matches}",
    )
}

/// Subscription exhausted message, sent once per emptiness episode.
pub fn format_lost_matches(num: usize, gift: &str, last_floor: Ton) -> String {
    format!(
        "📭 Subscription #{num} <b>{gift}</b>\n\
         No matching listings remain (last floor was {last_floor}).",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftwatch_core::{ListingId, Marketplace};
    use pretty_assertions::assert_eq;

    fn sample_listing() -> Listing {
        Listing {
            id: ListingId::new(Marketplace::Portal, "ab12"),
            gift: "Plush Pepe".into(),
            model: Some("Mint".into()),
            backdrop: None,
            price: Ton::from_f64(10.0),
        }
    }

    #[test]
    fn test_cheap_lot_shows_net_after_fee() {
        let text = format_cheap_lot(&sample_listing(), &FeeRates::default());
        assert!(text.contains("Plush Pepe"));
        assert!(text.contains("(Mint)"));
        assert!(text.contains("10 TON"));
        // 5% fee on 10 TON
        assert!(text.contains("9.5 TON"));
        assert!(text.contains("Portal:ab12"));
    }

    #[test]
    fn test_floor_change_direction_markers() {
        let down = format_floor_change(
            1,
            "Plush Pepe",
            Some(Ton::from_f64(5.0)),
            Ton::from_f64(4.0),
            2,
        );
        assert!(down.contains("📉"));

        let up = format_floor_change(
            1,
            "Plush Pepe",
            Some(Ton::from_f64(4.0)),
            Ton::from_f64(5.0),
            0,
        );
        assert!(up.contains("📈"));

        let first = format_floor_change(2, "Candy Cane", None, Ton::from_f64(1.0), 3);
        assert!(first.contains("first sighting"));
        assert!(first.contains("#2"));
    }

    #[test]
    fn test_lost_matches_mentions_last_floor() {
        let text = format_lost_matches(3, "Candy Cane", Ton::from_f64(2.5));
        assert_eq!(
            text,
            "📭 Subscription #3 <b>Candy Cane</b>\nNo matching listings remain (last floor was 2.5 TON)."
        );
    }
}

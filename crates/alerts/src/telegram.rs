//! Telegram delivery and bot command handlers.

use crate::sink::{DeliveryError, NotificationSink};
use async_trait::async_trait;
use giftwatch_core::{GiftFilter, Subscription, Ton, UserId};
use giftwatch_store::StateStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use thiserror::Error;
use tracing::info;

static SUB_SEQ: AtomicU64 = AtomicU64::new(1);

/// Generate an opaque subscription id, unique across restarts.
pub fn next_subscription_id() -> String {
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    format!("s{}-{}", now_ms, SUB_SEQ.fetch_add(1, Ordering::Relaxed))
}

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
}

/// Bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Register and show current settings")]
    Start,
    #[command(description = "Show current configuration")]
    Config,
    #[command(description = "Pause cheap-lot monitoring")]
    Pause,
    #[command(description = "Resume cheap-lot monitoring")]
    Resume,
    #[command(description = "Set cheap-lot price ceiling in TON. Usage: /maxprice 10 (or 'off')")]
    MaxPrice(String),
    #[command(description = "Toggle auto-buy on or off")]
    AutoBuy,
    #[command(description = "Add a subscription. Usage: /sub Plush Pepe 10")]
    Sub(String),
    #[command(description = "Delete a subscription by number. Usage: /unsub 2")]
    Unsub(String),
    #[command(description = "List subscriptions")]
    Subs,
    #[command(description = "Show help")]
    Help,
}

/// Telegram bot wrapper: delivers notifications and serves commands.
pub struct TelegramBot {
    bot: Bot,
    store: StateStore,
}

impl TelegramBot {
    pub fn new(token: &str, store: StateStore) -> Self {
        Self {
            bot: Bot::new(token),
            store,
        }
    }

    /// Run the bot command dispatcher until shutdown.
    pub async fn run(self: Arc<Self>) {
        let bot = self.bot.clone();
        let handler = Update::filter_message().filter_command::<Command>().endpoint(
            move |bot: Bot, msg: Message, cmd: Command| {
                let this = Arc::clone(&self);
                async move { this.handle_command(bot, msg, cmd).await }
            },
        );

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    async fn handle_command(
        &self,
        bot: Bot,
        msg: Message,
        cmd: Command,
    ) -> Result<(), TelegramError> {
        let chat_id = msg.chat.id;
        let user = UserId(chat_id.0);

        let reply = match cmd {
            Command::Start => {
                info!(user = %user, "user registered");
                self.store
                    .update(|s| {
                        s.ensure_user(user);
                    })
                    .await;
                "Welcome to Gift Watch!\n\n\
                 Your chat is now registered. Cheap-lot monitoring is off \
                 until you /resume and set a /maxprice.\n\
                 Use /help to see available commands."
                    .to_string()
            }
            Command::Config => self.store.read(|s| describe_config(s.users.get(&user))).await,
            Command::Pause => {
                self.store
                    .update(|s| s.ensure_user(user).enabled = false)
                    .await;
                "Cheap-lot monitoring paused.".to_string()
            }
            Command::Resume => {
                self.store
                    .update(|s| s.ensure_user(user).enabled = true)
                    .await;
                "Cheap-lot monitoring resumed.".to_string()
            }
            Command::MaxPrice(arg) => self.set_max_price(user, arg.trim()).await,
            Command::AutoBuy => {
                let enabled = self
                    .store
                    .update(|s| {
                        let cfg = s.ensure_user(user);
                        cfg.auto_buy_enabled = !cfg.auto_buy_enabled;
                        cfg.auto_buy_enabled
                    })
                    .await;
                if enabled {
                    "Auto-buy enabled.".to_string()
                } else {
                    "Auto-buy disabled.".to_string()
                }
            }
            Command::Sub(arg) => self.add_subscription(user, arg.trim()).await,
            Command::Unsub(arg) => self.remove_subscription(user, arg.trim()).await,
            Command::Subs => self.store.read(|s| describe_subs(s.users.get(&user))).await,
            Command::Help => Command::descriptions().to_string(),
        };

        bot.send_message(chat_id, reply)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn set_max_price(&self, user: UserId, arg: &str) -> String {
        if arg.eq_ignore_ascii_case("off") {
            self.store
                .update(|s| s.ensure_user(user).max_price = None)
                .await;
            return "Price ceiling removed.".to_string();
        }
        match arg.parse::<f64>() {
            Ok(value) if value > 0.0 => {
                let price = Ton::from_f64(value);
                self.store
                    .update(|s| s.ensure_user(user).max_price = Some(price))
                    .await;
                format!("Price ceiling set to {price}.")
            }
            _ => "Usage: /maxprice 10 (or 'off')".to_string(),
        }
    }

    async fn add_subscription(&self, user: UserId, arg: &str) -> String {
        if arg.is_empty() {
            return "Usage: /sub &lt;gift name&gt; [max price]".to_string();
        }
        // A trailing number is the price ceiling; the rest is the gift name.
        let mut words: Vec<&str> = arg.split_whitespace().collect();
        let max_price = words
            .last()
            .and_then(|w| w.parse::<f64>().ok())
            .filter(|v| *v > 0.0)
            .map(Ton::from_f64);
        if max_price.is_some() {
            words.pop();
        }
        let gift = words.join(" ");
        if gift.is_empty() {
            return "Usage: /sub &lt;gift name&gt; [max price]".to_string();
        }

        let sub = Subscription::new(next_subscription_id(), GiftFilter::new(&gift), max_price);
        let num = self
            .store
            .update(|s| {
                let cfg = s.ensure_user(user);
                cfg.subscriptions.push(sub);
                cfg.subscriptions.len()
            })
            .await;
        match max_price {
            Some(price) => format!("Subscription #{num} added: <b>{gift}</b> up to {price}."),
            None => format!("Subscription #{num} added: <b>{gift}</b>."),
        }
    }

    async fn remove_subscription(&self, user: UserId, arg: &str) -> String {
        let Ok(num) = arg.parse::<usize>() else {
            return "Usage: /unsub &lt;number&gt; (see /subs)".to_string();
        };
        let removed = self
            .store
            .update(|s| {
                let cfg = s.ensure_user(user);
                if num == 0 || num > cfg.subscriptions.len() {
                    None
                } else {
                    Some(cfg.subscriptions.remove(num - 1))
                }
            })
            .await;
        match removed {
            Some(sub) => format!("Subscription #{num} ({}) deleted.", sub.filter.gift),
            None => format!("No subscription #{num}."),
        }
    }
}

fn describe_config(cfg: Option<&giftwatch_core::UserConfig>) -> String {
    let Some(cfg) = cfg else {
        return "Not registered yet. Send /start first.".to_string();
    };
    format!(
        "Monitoring: {}\n\
         Gift filter: {}\n\
         Price ceiling: {}\n\
         Price floor: {}\n\
         Auto-buy: {}\n\
         Subscriptions: {}",
        if cfg.enabled { "on" } else { "off" },
        if cfg.filter.gift.is_empty() {
            "any".to_string()
        } else {
            cfg.filter.gift.to_string()
        },
        cfg.max_price
            .map_or("none".to_string(), |p| p.to_string()),
        cfg.min_price
            .map_or("none".to_string(), |p| p.to_string()),
        if cfg.auto_buy_enabled { "on" } else { "off" },
        cfg.subscriptions.len(),
    )
}

fn describe_subs(cfg: Option<&giftwatch_core::UserConfig>) -> String {
    let subs = cfg.map(|c| c.subscriptions.as_slice()).unwrap_or_default();
    if subs.is_empty() {
        return "No subscriptions. Add one with /sub.".to_string();
    }
    let mut out = String::from("Subscriptions:\n");
    for (i, sub) in subs.iter().enumerate() {
        let ceiling = sub
            .max_price
            .map_or("no ceiling".to_string(), |p| format!("up to {p}"));
        let floor = sub
            .watch
            .last_known_floor()
            .map_or("floor unknown".to_string(), |f| format!("floor {f}"));
        out.push_str(&format!(
            "#{} {}: {}, {}, {}\n",
            i + 1,
            sub.filter.gift,
            if sub.enabled { "on" } else { "off" },
            ceiling,
            floor,
        ));
    }
    out
}

#[async_trait]
impl NotificationSink for TelegramBot {
    async fn send(&self, user: UserId, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(ChatId(user.0), text)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| DeliveryError {
                user,
                message: e.to_string(),
            })?;
        Ok(())
    }
}

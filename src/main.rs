use dotenv::dotenv;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::dispatching::*;
use teloxide::types::ParseMode;
use teloxide::{prelude::*, utils::command::BotCommands};

mod config;
mod db;
mod error;
mod navigation;
mod postgrest;
mod render;
mod smoothie;
mod store;
mod views;

use config::Config;
use navigation::{History, NavMode, Navigator, Route};
use smoothie::{OrderBy, SmoothieId};
use store::SmoothieStore;
use views::create::CreateView;
use views::form::{Field, SmoothieForm};
use views::list::ListView;
use views::update::UpdateView;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type MyDialogue = Dialogue<State, InMemStorage<State>>;
type Store = Arc<dyn SmoothieStore>;

/// Reply that keeps the current value of a form field.
const KEEP: &str = "-";

#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
enum Command {
    #[command(description = "Display this text.")]
    Help,
    #[command(description = "Show every smoothie.")]
    List,
    #[command(description = "Order the list by created, title or rating.")]
    Order(String),
    #[command(description = "Add a new smoothie.")]
    New,
    #[command(description = "Edit the smoothie with the given id.")]
    Edit(SmoothieId),
    #[command(description = "Delete the smoothie with the given id from the list.")]
    Delete(SmoothieId),
    #[command(description = "Open a page by path, / or /<id>.")]
    Go(String),
    #[command(description = "Abandon the current form.")]
    Cancel,
}

/// A form being filled in one field per message.
#[derive(Clone)]
pub struct FormDraft<V> {
    view: V,
    step: Field,
    history: History,
}

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    Browsing(ListView),
    Creating(FormDraft<CreateView>),
    Editing(FormDraft<UpdateView>),
}

#[tokio::main]
async fn main() {
    // Load all env variables from .env file.
    dotenv().ok();
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();
    log::info!("Starting bot...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let store: Store = match config.open_store() {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to open the smoothie store: {}", e);
            std::process::exit(1);
        }
    };

    let bot = Bot::from_env();

    let commands = dptree::entry()
        .filter_command::<Command>()
        .branch(dptree::case![Command::Help].endpoint(help))
        .branch(dptree::case![Command::List].endpoint(list))
        .branch(dptree::case![Command::Order(key)].endpoint(order))
        .branch(dptree::case![Command::New].endpoint(new_smoothie))
        .branch(dptree::case![Command::Edit(id)].endpoint(edit))
        .branch(dptree::case![Command::Delete(id)].endpoint(delete))
        .branch(dptree::case![Command::Go(path)].endpoint(go))
        .branch(dptree::case![Command::Cancel].endpoint(cancel));

    let handler = Update::filter_message()
        .enter_dialogue::<Message, InMemStorage<State>, State>()
        .branch(commands)
        .branch(dptree::case![State::Creating(draft)].endpoint(receive_create_field))
        .branch(dptree::case![State::Editing(draft)].endpoint(receive_edit_field))
        .branch(dptree::endpoint(unknown));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![store, InMemStorage::<State>::new()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

async fn unknown(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "Use /list to see the smoothies or /help for more.")
        .await?;
    Ok(())
}

async fn send_list(bot: &Bot, chat: ChatId, view: &ListView) -> HandlerResult {
    for message in render::render_list(view) {
        bot.send_message(chat, message)
            .parse_mode(ParseMode::MarkdownV2)
            .await?;
    }
    Ok(())
}

async fn prompt(bot: &Bot, chat: ChatId, form: &SmoothieForm, step: Field) -> HandlerResult {
    bot.send_message(chat, render::render_prompt(form, step))
        .await?;
    Ok(())
}

/// Renders whatever page `history` currently points at.
async fn show(
    bot: &Bot,
    dialogue: &MyDialogue,
    store: &dyn SmoothieStore,
    chat: ChatId,
    mut history: History,
) -> HandlerResult {
    if let Route::Edit(id) = history.current() {
        match UpdateView::mount(id, store, &mut history).await {
            Some(view) => {
                bot.send_message(
                    chat,
                    format!("Editing smoothie {}. Reply {} to keep a value.", id, KEEP),
                )
                .await?;
                prompt(bot, chat, &view.form, Field::Title).await?;
                dialogue
                    .update(State::Editing(FormDraft {
                        view,
                        step: Field::Title,
                        history,
                    }))
                    .await?;
                return Ok(());
            }
            None => {
                bot.send_message(chat, format!("Smoothie {} was not found.", id))
                    .await?;
            }
        }
    }

    let mut view = ListView::new();
    view.mount(store).await;
    dialogue.update(State::Browsing(view.clone())).await?;
    send_list(bot, chat, &view).await?;
    Ok(())
}

async fn list(bot: Bot, dialogue: MyDialogue, store: Store, msg: Message) -> HandlerResult {
    show(
        &bot,
        &dialogue,
        store.as_ref(),
        msg.chat.id,
        History::at(Route::List),
    )
    .await
}

async fn order(
    bot: Bot,
    dialogue: MyDialogue,
    store: Store,
    msg: Message,
    key: String,
    state: State,
) -> HandlerResult {
    let order_by: OrderBy = match key.parse() {
        Ok(order_by) => order_by,
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
            return Ok(());
        }
    };
    let mut view = match state {
        State::Browsing(view) => view,
        _ => ListView::new(),
    };
    if !view.set_order(order_by, store.as_ref()).await {
        log::debug!("List already ordered by {}", order_by);
    }
    dialogue.update(State::Browsing(view.clone())).await?;
    send_list(&bot, msg.chat.id, &view).await?;
    Ok(())
}

async fn new_smoothie(bot: Bot, dialogue: MyDialogue, msg: Message) -> HandlerResult {
    let draft = FormDraft {
        view: CreateView::new(),
        step: Field::Title,
        history: History::at(Route::List),
    };
    prompt(&bot, msg.chat.id, &draft.view.form, draft.step).await?;
    dialogue.update(State::Creating(draft)).await?;
    Ok(())
}

async fn edit(
    bot: Bot,
    dialogue: MyDialogue,
    store: Store,
    msg: Message,
    id: SmoothieId,
) -> HandlerResult {
    let mut history = History::at(Route::List);
    history.navigate(Route::Edit(id), NavMode::Push);
    show(&bot, &dialogue, store.as_ref(), msg.chat.id, history).await
}

async fn go(
    bot: Bot,
    dialogue: MyDialogue,
    store: Store,
    msg: Message,
    path: String,
) -> HandlerResult {
    let route: Route = match path.parse() {
        Ok(route) => route,
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
            return Ok(());
        }
    };
    let mut history = History::at(Route::List);
    if route != Route::List {
        history.navigate(route, NavMode::Push);
    }
    show(&bot, &dialogue, store.as_ref(), msg.chat.id, history).await
}

async fn delete(
    bot: Bot,
    dialogue: MyDialogue,
    store: Store,
    msg: Message,
    id: SmoothieId,
    state: State,
) -> HandlerResult {
    let mut view = match state {
        State::Browsing(view) => view,
        _ => {
            bot.send_message(msg.chat.id, "Open the list with /list first.")
                .await?;
            return Ok(());
        }
    };
    // A failure is kept as the list notice and rendered below.
    if view.delete(id, store.as_ref()).await.is_ok() {
        log::info!("Smoothie {} removed from chat {}", id, msg.chat.id.0);
    }
    dialogue.update(State::Browsing(view.clone())).await?;
    send_list(&bot, msg.chat.id, &view).await?;
    Ok(())
}

async fn cancel(
    bot: Bot,
    dialogue: MyDialogue,
    store: Store,
    msg: Message,
    state: State,
) -> HandlerResult {
    let mut history = match state {
        State::Creating(draft) => draft.history,
        State::Editing(draft) => draft.history,
        _ => History::at(Route::List),
    };
    history.back();
    show(&bot, &dialogue, store.as_ref(), msg.chat.id, history).await
}

/// Reply for a slash message that reached a form without parsing as a command.
fn command_error(text: &str) -> Option<String> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }
    let reason = match Command::parse(text, "") {
        Err(e) => e.to_string(),
        Ok(_) => "That command cannot be used here".to_string(),
    };
    Some(format!(
        "{}. Use /help for the commands or /cancel to leave the form.",
        reason
    ))
}

/// Stores `text` into the current field unless it is the keep marker.
fn fill(form: &mut SmoothieForm, step: Field, text: &str) {
    let text = text.trim();
    if text != KEEP {
        form.set(step, text);
    }
}

async fn receive_create_field(
    bot: Bot,
    dialogue: MyDialogue,
    store: Store,
    msg: Message,
    mut draft: FormDraft<CreateView>,
) -> HandlerResult {
    let chat = msg.chat.id;
    let Some(text) = msg.text() else {
        bot.send_message(chat, "Please send the value as text.").await?;
        return Ok(());
    };
    if let Some(reply) = command_error(text) {
        bot.send_message(chat, reply).await?;
        return Ok(());
    }
    fill(&mut draft.view.form, draft.step, text);

    if let Some(next) = draft.step.next() {
        draft.step = next;
        prompt(&bot, chat, &draft.view.form, next).await?;
        dialogue.update(State::Creating(draft)).await?;
        return Ok(());
    }

    match draft.view.submit(store.as_ref(), &mut draft.history).await {
        Ok(created) => {
            bot.send_message(chat, format!("Created {}.", created.title))
                .await?;
            show(&bot, &dialogue, store.as_ref(), chat, draft.history).await
        }
        Err(e) => {
            bot.send_message(chat, e.user_message()).await?;
            draft.step = Field::Title;
            prompt(&bot, chat, &draft.view.form, draft.step).await?;
            dialogue.update(State::Creating(draft)).await?;
            Ok(())
        }
    }
}

async fn receive_edit_field(
    bot: Bot,
    dialogue: MyDialogue,
    store: Store,
    msg: Message,
    mut draft: FormDraft<UpdateView>,
) -> HandlerResult {
    let chat = msg.chat.id;
    let Some(text) = msg.text() else {
        bot.send_message(chat, "Please send the value as text.").await?;
        return Ok(());
    };
    if let Some(reply) = command_error(text) {
        bot.send_message(chat, reply).await?;
        return Ok(());
    }
    fill(&mut draft.view.form, draft.step, text);

    if let Some(next) = draft.step.next() {
        draft.step = next;
        prompt(&bot, chat, &draft.view.form, next).await?;
        dialogue.update(State::Editing(draft)).await?;
        return Ok(());
    }

    match draft.view.submit(store.as_ref(), &mut draft.history).await {
        Ok(updated) => {
            bot.send_message(chat, format!("Updated {}.", updated.title))
                .await?;
            show(&bot, &dialogue, store.as_ref(), chat, draft.history).await
        }
        Err(e) => {
            bot.send_message(chat, e.user_message()).await?;
            draft.step = Field::Title;
            prompt(&bot, chat, &draft.view.form, draft.step).await?;
            dialogue.update(State::Editing(draft)).await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_marker_leaves_the_field_untouched() {
        let mut form = SmoothieForm::default();
        fill(&mut form, Field::Title, "  Mango Tango ");
        fill(&mut form, Field::Title, KEEP);
        assert_eq!(form.title, "Mango Tango");
        fill(&mut form, Field::Rating, "-3");
        assert_eq!(form.rating, "-3");
    }

    #[test]
    fn malformed_commands_are_not_taken_as_field_values() {
        assert_eq!(command_error("Mango Tango"), None);
        assert_eq!(command_error("-"), None);
        for text in ["/edit abc", "/order", "/foo", " /delete x "] {
            let reply = command_error(text).unwrap();
            assert!(reply.ends_with("Use /help for the commands or /cancel to leave the form."));
        }
    }

    #[test]
    fn commands_parse_with_arguments() {
        assert!(matches!(
            Command::parse("/edit 12", "smoothie_bot"),
            Ok(Command::Edit(12))
        ));
        assert!(matches!(
            Command::parse("/order title", "smoothie_bot"),
            Ok(Command::Order(key)) if key == "title"
        ));
        assert!(matches!(
            Command::parse("/go /3", "smoothie_bot"),
            Ok(Command::Go(path)) if path == "/3"
        ));
    }
}

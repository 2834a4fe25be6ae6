//! Interactive terminal client.
//!
//! Thin collaborator around the session core: a rustyline loop that maps
//! commands onto navigation (gated by the [`SessionGuard`]) and API calls.
//! All trust decisions live in the guard; the shell only renders.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::config::Config;

use super::api::ApiClient;
use super::router::Router;
use super::session::{SessionGuard, SessionUser};
use super::storage::TokenStorageStack;

/// Run the client shell against a gateway.
pub async fn run_client(base_url: &str) -> Result<()> {
    let data_dir = Config::data_dir()?;
    let api = ApiClient::new(base_url);
    let storage = TokenStorageStack::standard(&data_dir);
    let mut guard = SessionGuard::new(api, storage);
    let mut router = build_routes();

    router.init();
    // A still-valid persisted session skips the login page
    if guard.is_authenticated() {
        router.navigate("/home");
    }

    println!("🧵 threadline client — {base_url} (type `help`)");

    let mut editor = DefaultEditor::new()?;
    loop {
        let line = match editor.readline("threadline> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match command {
            "help" => print_help(),
            "quit" | "exit" => break,
            "signup" => signup(&mut guard, &mut router, &args).await,
            "login" => login(&mut guard, &mut router, &args).await,
            "logout" => {
                guard.logout();
                router.navigate("/");
                println!("Logged out.");
            }
            "whoami" => match &guard.state().user {
                Some(user) => println!("{} <{}>", user.id, user.email),
                None => println!("Not logged in."),
            },
            "open" => {
                let path = args.first().copied().unwrap_or("/");
                open(&mut guard, &mut router, path).await;
            }
            "contacts" => {
                if let Some(token) = authed_token(&mut guard, &mut router).await {
                    match guard.api().contacts(&token).await {
                        Ok(contacts) if contacts.is_empty() => println!("No contacts yet."),
                        Ok(contacts) => {
                            for c in contacts {
                                println!("{}  {}  {}", c.id, c.name, c.phone_number);
                            }
                        }
                        Err(e) => println!("⚠ {e}"),
                    }
                }
            }
            "add" => {
                if args.len() < 2 {
                    println!("Usage: add <name> <phone>");
                    continue;
                }
                if let Some(token) = authed_token(&mut guard, &mut router).await {
                    match guard.api().create_contact(&token, args[0], args[1]).await {
                        Ok(contact) => println!("Added {} ({})", contact.name, contact.id),
                        Err(e) => println!("⚠ {e}"),
                    }
                }
            }
            "remove" => {
                let Some(contact_id) = args.first() else {
                    println!("Usage: remove <contact-id>");
                    continue;
                };
                if let Some(token) = authed_token(&mut guard, &mut router).await {
                    match guard.api().delete_contact(&token, contact_id).await {
                        Ok(true) => println!("Removed."),
                        Ok(false) => println!("No such contact."),
                        Err(e) => println!("⚠ {e}"),
                    }
                }
            }
            "messages" => {
                if args.len() < 2 {
                    println!("Usage: messages <contact-id> <contact-name>");
                    continue;
                }
                let path = format!(
                    "/messages/{}/{}",
                    args[0],
                    urlencoding::encode(args[1])
                );
                open(&mut guard, &mut router, &path).await;
                if let Some(token) = guard.state().token.clone() {
                    match guard.api().messages(&token, args[0]).await {
                        Ok(messages) if messages.is_empty() => println!("No messages yet."),
                        Ok(messages) => {
                            for m in messages {
                                let who = if m.sent_by == "user" { "you" } else { "them" };
                                println!("[{who}] {}", m.text);
                            }
                        }
                        Err(e) => println!("⚠ {e}"),
                    }
                }
            }
            "send" => {
                if args.len() < 2 {
                    println!("Usage: send <contact-id> <text...>");
                    continue;
                }
                if let Some(token) = authed_token(&mut guard, &mut router).await {
                    let text = args[1..].join(" ");
                    match guard.api().send_message(&token, args[0], &text).await {
                        Ok(_) => println!("Sent."),
                        Err(e) => println!("⚠ {e}"),
                    }
                }
            }
            "delete-account" => {
                if let Some(token) = authed_token(&mut guard, &mut router).await {
                    let result = guard.api().delete_account(&token).await;
                    match result {
                        Ok(true) => {
                            guard.logout();
                            router.navigate("/");
                            println!("Account deleted.");
                        }
                        Ok(false) => println!("⚠ Could not delete account."),
                        Err(e) => println!("⚠ {e}"),
                    }
                }
            }
            "health" => match guard.api().health().await {
                Ok(health) => println!(
                    "status={} database={} users={}",
                    health.status, health.database, health.users
                ),
                Err(e) => println!("⚠ {e}"),
            },
            other => println!("Unknown command `{other}` — try `help`."),
        }
    }

    println!("Bye!");
    Ok(())
}

/// View handlers for each route. Rendering only; gating happens in the
/// shell via the guard.
fn build_routes() -> Router {
    let mut router = Router::new();
    router.add_route("/", Box::new(|_| {
        println!("── Welcome — `login <email> <password>` or `signup <email> <name> <password>` ──");
    }));
    router.add_route("/home", Box::new(|_| {
        println!("── Contacts — `contacts`, `add`, `remove`, `messages` ──");
    }));
    router.add_route("/profile", Box::new(|_| {
        println!("── Profile — `whoami`, `delete-account`, `logout` ──");
    }));
    router.add_route(
        "/messages/{contact_id}/{contact_name}",
        Box::new(|params| {
            println!(
                "── Messages with {} — `send <contact-id> <text>` ──",
                params.get("contact_name").unwrap_or("?")
            );
        }),
    );
    router
}

async fn signup(guard: &mut SessionGuard, router: &mut Router, args: &[&str]) {
    if args.len() < 3 {
        println!("Usage: signup <email> <name> <password>");
        return;
    }
    let result = guard.api().signup(args[0], args[1], args[2]).await;
    match result {
        Ok(payload) if payload.success => {
            apply_auth(guard, router, payload.token, payload.user);
            println!("Account created.");
        }
        Ok(payload) => println!("⚠ {}", payload.error.unwrap_or_else(|| "Signup failed".into())),
        Err(e) => println!("⚠ {e}"),
    }
}

async fn login(guard: &mut SessionGuard, router: &mut Router, args: &[&str]) {
    if args.len() < 2 {
        println!("Usage: login <email> <password>");
        return;
    }
    let result = guard.api().login(args[0], args[1]).await;
    match result {
        Ok(payload) if payload.success => {
            apply_auth(guard, router, payload.token, payload.user);
            println!("Welcome back.");
        }
        Ok(payload) => println!("⚠ {}", payload.error.unwrap_or_else(|| "Login failed".into())),
        Err(e) => println!("⚠ {e}"),
    }
}

fn apply_auth(
    guard: &mut SessionGuard,
    router: &mut Router,
    token: Option<String>,
    user: Option<crate::auth::UserProfile>,
) {
    if let Some(token) = token {
        let user = user.map(|u| SessionUser {
            id: u.id,
            email: u.email,
        });
        guard.login(&token, user);
        router.navigate("/home");
    }
}

/// Navigate, then run the composite gate for protected routes. On
/// rejection the guard has already redirected to the entry route.
async fn open(guard: &mut SessionGuard, router: &mut Router, path: &str) {
    if path == "/" {
        // The entry route redirects authenticated users home
        if guard.is_authenticated() {
            router.navigate("/home");
        } else {
            router.navigate("/");
        }
        return;
    }
    router.navigate(path);
    if !guard.require_auth(router).await {
        println!("🔒 Please login first.");
    }
}

/// Current token if the session passes the local check; otherwise redirect
/// to the entry route.
async fn authed_token(guard: &mut SessionGuard, router: &mut Router) -> Option<String> {
    if guard.is_authenticated() {
        return guard.state().token.clone();
    }
    router.navigate("/");
    println!("🔒 Please login first.");
    None
}

fn print_help() {
    println!("Commands:");
    println!("  signup <email> <name> <password>   create an account");
    println!("  login <email> <password>           start a session");
    println!("  logout                             end the session");
    println!("  whoami                             show the cached identity");
    println!("  open <path>                        navigate (/, /home, /profile)");
    println!("  contacts | add | remove            manage contacts");
    println!("  messages <id> <name> | send        message threads");
    println!("  delete-account                     remove the account");
    println!("  health                             gateway health probe");
    println!("  quit");
}

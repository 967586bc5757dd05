use crate::cli::arg;
use anyhow::{bail, Context as _, Result};
use clap::ArgMatches;
use std::sync::Arc;
use ufund_client::{Backend, HttpBackend};
use ufund_core::{
    AdminConsole, BasketEntry, ChatBox, CheckoutReport, Cupboard, CurrentUser, EntryId, LoginOutcome,
    ReconcileOutcome, SessionFlow, UfundConfig, WriteBehindQueue,
};
use ufund_model::{BasketNeed, Need, NeedId, UserId};

/// Everything a command needs
pub(crate) struct Context {
    pub(crate) config: UfundConfig,
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) queue: Arc<WriteBehindQueue>,
    pub(crate) sessions: SessionFlow,
    pub(crate) json: bool,
    user: Option<String>,
    password: Option<String>,
}

impl Context {
    pub(crate) fn new(config: UfundConfig, globals: &ArgMatches) -> Result<Self> {
        let backend: Arc<dyn Backend> =
            Arc::new(HttpBackend::new(&config.client).context("creating backend client")?);
        let queue = Arc::new(WriteBehindQueue::spawn(
            Arc::clone(&backend),
            config.write_retry,
        ));
        Ok(Self {
            sessions: SessionFlow::new(Arc::clone(&backend)),
            config,
            backend,
            queue,
            json: globals.get_flag("json"),
            user: globals.get_one::<String>("user").cloned(),
            password: globals.get_one::<String>("password").cloned(),
        })
    }

    async fn login(&self) -> Result<CurrentUser> {
        let (Some(user), Some(password)) = (&self.user, &self.password) else {
            bail!("this command needs --user and --password");
        };
        match self.sessions.login(user, password).await {
            LoginOutcome::LoggedIn(current) => Ok(current),
            LoginOutcome::MissingFields => bail!("please enter username and password"),
            LoginOutcome::InvalidCredentials => {
                bail!("invalid credentials, try again or create an account")
            }
            LoginOutcome::Restricted => bail!("unable to login, user is restricted"),
        }
    }

    fn cupboard(&self, user: UserId) -> Arc<Cupboard> {
        let outbox: Arc<dyn ufund_core::Outbox> = self.queue.clone();
        Arc::new(Cupboard::new(Arc::clone(&self.backend), outbox, user))
    }

    fn print_json<T: serde::Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Run one subcommand while logged in, logging out afterwards
pub(crate) async fn run(ctx: &Context, name: &str, args: &ArgMatches) -> Result<()> {
    match name {
        "needs" => return needs(ctx, args).await,
        "personalities" => return personalities(ctx).await,
        _ => {}
    }

    let current = ctx.login().await?;
    let result = match name {
        "basket" => basket(ctx, &current).await,
        "add" => add(ctx, &current, args).await,
        "edit" => edit(ctx, &current, args).await,
        "remove" => remove(ctx, &current, args).await,
        "checkout" => checkout(ctx, &current).await,
        "create-need" => create_need(ctx, &current, args).await,
        "delete-need" => delete_need(ctx, &current, args).await,
        "restrict" => restrict(ctx, &current, args).await,
        "chat" => chat(ctx, &current, args).await,
        other => Err(anyhow::anyhow!("unknown command `{other}`")),
    };
    ctx.sessions.logout(&current).await;
    result
}

async fn needs(ctx: &Context, args: &ArgMatches) -> Result<()> {
    let term = args.get_one::<String>("search").map_or("", String::as_str);
    let found = ctx.cupboard(UserId::GUEST).search(term).await;

    if ctx.json {
        return ctx.print_json(&found);
    }
    if found.is_empty() {
        println!("No needs found");
    }
    for need in &found {
        print_need(need);
    }
    Ok(())
}

fn print_need(need: &Need) {
    let state = if need.is_fulfilled() { "  fulfilled" } else { "" };
    println!(
        "{:>4}  {:<24} {:>4}/{:<4} {}{state}",
        need.id.0, need.name, need.quantity, need.cost, need.need_type
    );
}

async fn basket(ctx: &Context, current: &CurrentUser) -> Result<()> {
    let entries = ctx.cupboard(current.id).open_basket().await;
    let wire: Vec<BasketNeed> = entries.iter().map(BasketEntry::to_wire).collect();

    if ctx.json {
        return ctx.print_json(&wire);
    }
    if wire.is_empty() {
        println!("Your basket is empty");
    }
    for (position, entry) in wire.iter().enumerate() {
        println!(
            "{:>3}. {:<24} count {:<4} ({} of {} committed)",
            position + 1,
            entry.need.name,
            entry.count,
            entry.need.quantity,
            entry.need.cost
        );
    }
    Ok(())
}

async fn add(ctx: &Context, current: &CurrentUser, args: &ArgMatches) -> Result<()> {
    let id = NeedId(arg::<i32>(args, "need-id")?);
    let count = arg::<i32>(args, "count")?;
    let cupboard = ctx.cupboard(current.id);

    cupboard.refresh_catalog().await;
    let need = cupboard
        .need(id)
        .await
        .with_context(|| format!("need {id} is not in the cupboard"))?;

    if !cupboard.add_to_basket(&need, count).await {
        bail!("could not add {} to the basket", need.name);
    }
    println!("Added {} x{} to your basket", need.name, count.max(1));
    Ok(())
}

async fn entry_at(cupboard: &Cupboard, args: &ArgMatches) -> Result<EntryId> {
    let position = arg::<usize>(args, "position")?;
    let index = position
        .checked_sub(1)
        .context("positions start at 1")?;
    cupboard
        .entry_at(index)
        .await
        .with_context(|| format!("no basket entry at position {position}"))
}

async fn edit(ctx: &Context, current: &CurrentUser, args: &ArgMatches) -> Result<()> {
    let count = arg::<i32>(args, "count")?;
    let cupboard = ctx.cupboard(current.id);
    cupboard.open_basket().await;
    let entry = entry_at(&cupboard, args).await?;

    match cupboard.edit_count(entry, count).await {
        ReconcileOutcome::Applied { count, clamped: true } => {
            println!("Only {count} still needed; count set to {count}");
        }
        ReconcileOutcome::Applied { count, .. } => println!("Count set to {count}"),
        ReconcileOutcome::Refreshed => println!("Count unchanged"),
        ReconcileOutcome::Rejected(reason) => bail!("count rejected: {reason:?}"),
        ReconcileOutcome::Dropped => bail!("that need has left the cupboard"),
        ReconcileOutcome::UnknownEntry => bail!("basket entry disappeared"),
        ReconcileOutcome::CatalogUnavailable => bail!("cupboard unavailable, try again later"),
    }
    Ok(())
}

async fn remove(ctx: &Context, current: &CurrentUser, args: &ArgMatches) -> Result<()> {
    let cupboard = ctx.cupboard(current.id);
    cupboard.open_basket().await;
    let entry = entry_at(&cupboard, args).await?;

    if cupboard.remove(entry).await {
        println!("Removed");
    }
    Ok(())
}

async fn checkout(ctx: &Context, current: &CurrentUser) -> Result<()> {
    let cupboard = ctx.cupboard(current.id);
    cupboard.open_basket().await;
    let report = cupboard.checkout().await;

    if ctx.json {
        let residue: Vec<BasketNeed> = report.residue.iter().map(BasketEntry::to_wire).collect();
        return ctx.print_json(&serde_json::json!({
            "committed": report.committed,
            "residue": residue,
        }));
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &CheckoutReport) {
    println!("Committed {} need(s)", report.committed.len());
    if report.is_blocked() {
        println!("Some needs could not be fulfilled and remain in your basket:");
        for entry in &report.residue {
            println!(
                "  {} count {} (only {} still needed)",
                entry.need.name,
                entry.count,
                entry.need.remaining().max(0)
            );
        }
    }
}

fn console(ctx: &Context, current: &CurrentUser) -> Result<AdminConsole> {
    Ok(AdminConsole::for_user(
        Arc::clone(&ctx.backend),
        ctx.cupboard(current.id),
        current,
        &ctx.config.admin_user_name,
    )?)
}

async fn create_need(ctx: &Context, current: &CurrentUser, args: &ArgMatches) -> Result<()> {
    let console = console(ctx, current)?;
    let need = Need::new(
        arg::<String>(args, "name")?,
        arg::<i32>(args, "cost")?,
        arg::<String>(args, "type")?,
    )
    .with_quantity(arg::<i32>(args, "quantity")?)
    .with_description(arg::<String>(args, "description")?);

    match console.create_need(&need).await? {
        Some(created) => println!("Created need {}: {}", created.id, created.name),
        None => bail!("a need named {} already exists", need.name),
    }
    Ok(())
}

async fn delete_need(ctx: &Context, current: &CurrentUser, args: &ArgMatches) -> Result<()> {
    let console = console(ctx, current)?;
    let id = NeedId(arg::<i32>(args, "need-id")?);

    if !console.delete_need(id).await {
        bail!("need {id} could not be deleted");
    }
    println!("Deleted need {id}");
    Ok(())
}

async fn restrict(ctx: &Context, current: &CurrentUser, args: &ArgMatches) -> Result<()> {
    let console = console(ctx, current)?;

    let Some(user_name) = args.get_one::<String>("user-name") else {
        for user in console.restrictable_users().await {
            let state = if user.restricted { "restricted" } else { "active" };
            println!("{:<24} {state}", user.user_name);
        }
        return Ok(());
    };

    match console.toggle_restriction(user_name).await {
        Some(true) => println!("{user_name} is now restricted"),
        Some(false) => println!("{user_name} is no longer restricted"),
        None => bail!("cannot change the restriction of {user_name}"),
    }
    Ok(())
}

async fn personalities(ctx: &Context) -> Result<()> {
    let chat = ChatBox::new(Arc::clone(&ctx.backend), CurrentUser::guest());
    let personalities = chat.personalities().await;

    if ctx.json {
        return ctx.print_json(&personalities);
    }
    for p in &personalities {
        println!("{:>3}  {:<16} {}", p.id, p.name, p.description);
    }
    Ok(())
}

async fn chat(ctx: &Context, current: &CurrentUser, args: &ArgMatches) -> Result<()> {
    let personality_id = arg::<i32>(args, "personality-id")?;
    let message = args
        .get_many::<String>("message")
        .map(|words| words.cloned().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    let mut chat = ChatBox::new(Arc::clone(&ctx.backend), current.clone());
    let personality = chat
        .personalities()
        .await
        .into_iter()
        .find(|p| p.id == personality_id)
        .with_context(|| format!("no personality with id {personality_id}"))?;

    chat.select(personality).await;
    chat.send(&message).await;

    if ctx.json {
        ctx.print_json(chat.transcript())?;
    } else {
        for line in chat.transcript() {
            println!("{}: {}", line.username, line.message);
        }
    }
    chat.close().await;
    Ok(())
}

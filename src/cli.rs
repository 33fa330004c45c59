// src/cli.rs

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use activedir::codec::{AttributeSyntax, RawValue, Value};
use activedir::config::AppConfig;
use activedir::credentials::Credentials;
use activedir::directory::{Directory, DirectoryObject, MemoryDirectory};
use activedir::filter::{Filter, QueryString, Scope};
use activedir::models::{EnumTable, FlagTable};
use activedir::path::{DirectoryPath, DistinguishedName};
use activedir::DirectoryError;

// === CLI ===

#[derive(Parser)]
#[command(name = "activedir")]
#[command(author, version, about = "Утилита для атрибутов и объектов Active Directory", long_about = None)]
pub struct Cli {
    /// Путь к config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON-снимок каталога (иначе directory.snapshot из конфига)
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Сервер каталога
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[arg(short, long, global = true)]
    pub user: Option<String>,

    #[arg(short, long, global = true)]
    pub password: Option<String>,

    /// Вывод в JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Декодировать значение атрибута
    Decode {
        attribute: String,
        value: String,
        /// Как понимать значение из командной строки
        #[arg(long, value_enum, default_value_t = RawKind::Text)]
        kind: RawKind,
        /// OID синтаксиса, если атрибут не известен таблице
        #[arg(long)]
        syntax: Option<String>,
    },
    /// Закодировать значение атрибута
    Encode {
        attribute: String,
        value: String,
        #[arg(long)]
        syntax: Option<String>,
    },
    /// Число → имена флагов или имена (через запятую) → число
    Flags { table: String, value: String },
    /// Разобрать путь ADSI
    Path { moniker: String },
    /// Разобрать LDAP-фильтр или строку запроса ADO
    Filter { expression: String },
    /// Показать объект
    Get {
        moniker: String,
        /// Только эти атрибуты
        attributes: Vec<String>,
    },
    /// Поиск по фильтру
    Search {
        filter: String,
        #[arg(long)]
        base: Option<String>,
        #[arg(long, default_value = "subtree")]
        scope: String,
        #[arg(short, long, value_delimiter = ',')]
        attributes: Vec<String>,
    },
    /// Членство в группах
    Member {
        #[command(subcommand)]
        cmd: MemberCommand,
    },
}

#[derive(Subcommand)]
pub enum MemberCommand {
    Add { group: String, member: String },
    Remove { group: String, member: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum RawKind {
    Text,
    Int,
    Large,
    Hex,
}

impl Cli {
    pub fn run(self, config: &AppConfig) -> anyhow::Result<()> {
        match &self.command {
            Command::Decode { attribute, value, kind, syntax } => {
                handle_decode(config, attribute, value, *kind, syntax.as_deref(), self.json)
            }
            Command::Encode { attribute, value, syntax } => {
                handle_encode(config, attribute, value, syntax.as_deref(), self.json)
            }
            Command::Flags { table, value } => handle_flags(table, value),
            Command::Path { moniker } => handle_path(moniker, self.json),
            Command::Filter { expression } => handle_filter(expression),
            Command::Get { moniker, attributes } => {
                let (_, directory) = self.open_directory(config)?;
                handle_get(&directory, moniker, attributes, self.json)
            }
            Command::Search { filter, base, scope, attributes } => {
                let (_, directory) = self.open_directory(config)?;
                handle_search(&directory, filter, base.as_deref(), scope, attributes, self.json)
            }
            Command::Member { cmd } => {
                let (store, directory) = self.open_directory(config)?;
                handle_member(&directory, cmd)?;
                store.save(self.snapshot_path(config)?)?;
                Ok(())
            }
        }
    }

    fn snapshot_path(&self, config: &AppConfig) -> anyhow::Result<PathBuf> {
        self.snapshot
            .clone()
            .or_else(|| config.directory.snapshot.as_ref().map(PathBuf::from))
            .ok_or_else(|| anyhow!("no directory snapshot: pass --snapshot or set directory.snapshot"))
    }

    fn credentials(&self, config: &AppConfig) -> anyhow::Result<Option<Credentials>> {
        let server = self.server.as_deref().or(config.directory.server.as_deref());
        let user = self.user.as_deref().or(config.credentials.username.as_deref());
        let netrc = config.credentials.netrc.as_ref().map(PathBuf::from);

        if let (Some(user), Some(password)) = (user, self.password.as_deref()) {
            return Ok(Some(Credentials::simple(user, password)));
        }
        let Some(host) = server else {
            return Ok(None);
        };
        match Credentials::from_netrc(host, netrc.as_deref()) {
            Ok(cred) => Ok(Some(cred)),
            Err(DirectoryError::NetrcNotFound(msg)) => {
                debug!(%msg, "no netrc credentials");
                Ok(None)
            }
            Err(DirectoryError::Io(e)) if netrc.is_none() => {
                debug!(error = %e, "default netrc is not readable");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn open_directory(&self, config: &AppConfig) -> anyhow::Result<(Arc<MemoryDirectory>, Directory)> {
        let path = self.snapshot_path(config)?;
        let store = Arc::new(
            MemoryDirectory::load(&path).with_context(|| format!("cannot load snapshot {}", path.display()))?,
        );
        let server = self.server.as_deref().or(config.directory.server.as_deref());
        let mut directory =
            Directory::connect(store.clone(), server, self.credentials(config)?)?
            .with_scheme(config.scheme()?)
            .with_page_size(config.directory.page_size);
        config.apply_schema(directory.codecs_mut())?;
        Ok((store, directory))
    }
}

// === Обработчики ===

fn codec_table(config: &AppConfig) -> anyhow::Result<activedir::CodecTable> {
    let mut codecs = activedir::CodecTable::standard();
    config.apply_schema(&mut codecs)?;
    Ok(codecs)
}

fn lookup(config: &AppConfig, attribute: &str, syntax: Option<&str>) -> anyhow::Result<activedir::Codec> {
    let codecs = codec_table(config)?;
    let syntax: Option<AttributeSyntax> = syntax.map(str::parse).transpose()?;
    Ok(codecs.lookup_with_syntax(attribute, syntax))
}

fn raw_from_cli(value: &str, kind: RawKind) -> anyhow::Result<RawValue> {
    Ok(match kind {
        RawKind::Text => RawValue::text(value),
        RawKind::Int => RawValue::Integer(value.parse().context("expected 32-bit integer")?),
        RawKind::Large => RawValue::LargeInteger(value.parse().context("expected 64-bit integer")?),
        RawKind::Hex => RawValue::Octets(hex::decode(value).context("expected hex bytes")?),
    })
}

fn print_value(value: &Value, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", value);
    }
    Ok(())
}

fn handle_decode(
    config: &AppConfig,
    attribute: &str,
    value: &str,
    kind: RawKind,
    syntax: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let codec = lookup(config, attribute, syntax)?;
    let raw = raw_from_cli(value, kind)?;
    debug!(attribute, codec = codec.name(), "decoding");
    print_value(&codec.decode(&raw), json)
}

fn handle_encode(
    config: &AppConfig,
    attribute: &str,
    value: &str,
    syntax: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let codec = lookup(config, attribute, syntax)?;
    let value = codec.parse_value(value)?;
    let raw = codec.encode(&value)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&raw)?);
    } else {
        println!("{}", raw);
    }
    Ok(())
}

fn handle_flags(table: &str, value: &str) -> anyhow::Result<()> {
    let number = value.trim().parse::<i64>().ok();

    if let Some(flags) = FlagTable::from_table_name(table) {
        match number {
            Some(n) => {
                let names = flags.names(table_value(n, table)?);
                println!("{}", names.into_iter().collect::<Vec<_>>().join(", "));
            }
            None => {
                let bits = flags
                    .bits(value.split(',').map(str::trim).filter(|s| !s.is_empty()))
                    .map_err(|name| anyhow!("unknown flag '{}' in {}", name, table))?;
                println!("{} (0x{:08X})", bits, bits);
            }
        }
        return Ok(());
    }

    if let Some(enumeration) = EnumTable::from_table_name(table) {
        match number {
            Some(n) => match enumeration.name(table_value(n, table)?) {
                Some(name) => println!("{}", name),
                None => println!("{}", n),
            },
            None => {
                let v = enumeration
                    .value(value.trim())
                    .ok_or_else(|| anyhow!("unknown name '{}' in {}", value, table))?;
                println!("{} (0x{:08X})", v, v);
            }
        }
        return Ok(());
    }

    bail!("unknown table '{}'", table)
}

/// 32-битное значение: без знака или со знаком, как groupType в выводе LDAP
fn table_value(n: i64, table: &str) -> anyhow::Result<u32> {
    u32::try_from(n)
        .or_else(|_| i32::try_from(n).map(|signed| signed as u32))
        .map_err(|_| anyhow!("value {} is out of range for {}", n, table))
}

fn handle_path(moniker: &str, json: bool) -> anyhow::Result<()> {
    let path = DirectoryPath::parse(moniker)?;
    let rdns: Vec<String> = match path.dn() {
        Ok(dn) => dn.rdns().iter().map(|r| r.to_string()).collect(),
        Err(_) => Vec::new(),
    };
    if json {
        let out = serde_json::json!({
            "scheme": path.scheme.as_str(),
            "server": path.server,
            "object": path.object,
            "rdns": rdns,
            "path": path.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("scheme: {}", path.scheme);
        println!("server: {}", path.server.as_deref().unwrap_or("-"));
        println!("object: {}", path.object);
        for rdn in rdns {
            println!("  {}", rdn);
        }
    }
    Ok(())
}

fn handle_filter(expression: &str) -> anyhow::Result<()> {
    if expression.trim_start().starts_with('<') {
        let query: QueryString = expression.parse()?;
        println!("{}", query);
    } else {
        let filter = Filter::parse(expression)?;
        println!("{}", filter);
    }
    Ok(())
}

fn print_object(object: &DirectoryObject<'_>, attributes: &[String], json: bool) -> anyhow::Result<()> {
    let values: Vec<(String, Value)> = if attributes.is_empty() {
        object.dump()
    } else {
        attributes.iter().map(|a| (a.clone(), object.get(a))).collect()
    };

    if json {
        let map: serde_json::Map<String, serde_json::Value> = values
            .into_iter()
            .map(|(k, v)| serde_json::to_value(&v).map(|json| (k, json)))
            .collect::<Result<_, serde_json::Error>>()?;
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({
            "path": object.path().to_string(),
            "attributes": map,
        }))?);
    } else {
        println!("{}", object.path());
        for (name, value) in values {
            println!("  {}: {}", name, value);
        }
    }
    Ok(())
}

fn handle_get(directory: &Directory, moniker: &str, attributes: &[String], json: bool) -> anyhow::Result<()> {
    let object = directory.open(moniker)?;
    print_object(&object, attributes, json)
}

fn handle_search(
    directory: &Directory,
    filter: &str,
    base: Option<&str>,
    scope: &str,
    attributes: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let filter = Filter::parse(filter)?;
    let scope: Scope = scope.parse()?;
    let base = base.map(DistinguishedName::parse).transpose()?;
    let found = directory.search(&filter, base.as_ref(), scope)?;
    for object in &found {
        print_object(object, attributes, json)?;
    }
    if !json {
        println!("✅ Найдено объектов: {}", found.len());
    }
    Ok(())
}

/// DN (есть `=`) или имя для поиска
fn resolve<'d>(
    directory: &'d Directory,
    name: &str,
    find: impl Fn(&'d Directory, &str) -> Result<Option<DirectoryObject<'d>>, DirectoryError>,
) -> anyhow::Result<DirectoryObject<'d>> {
    if name.contains('=') {
        return Ok(directory.open_dn(&DistinguishedName::parse(name)?)?);
    }
    find(directory, name)?.ok_or_else(|| anyhow!("Объект не найден: {}", name))
}

fn handle_member(directory: &Directory, cmd: &MemberCommand) -> anyhow::Result<()> {
    let (group, member, add) = match cmd {
        MemberCommand::Add { group, member } => (group, member, true),
        MemberCommand::Remove { group, member } => (group, member, false),
    };
    let mut group = resolve(directory, group, |d, n| d.find_group(n))?;
    let member = resolve(directory, member, |d, n| {
        Ok(match d.find_user(n)? {
            Some(user) => Some(user),
            None => d.find(n)?,
        })
    })?;

    if add {
        group.add_member(&member)?;
        println!("✅ {} добавлен в {}", member.dn(), group.dn());
    } else {
        group.remove_member(&member)?;
        println!("✅ {} удалён из {}", member.dn(), group.dn());
    }
    Ok(())
}

//! The highlighted tool list (`oplogger.conf`).
//!
//! One tool name per line. Blank lines and lines starting with `#` are
//! ignored. Order matters: when a command mentions several tools, the one
//! listed first wins.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::error::Warning;

/// Built-in tool list, used when no `oplogger.conf` exists.
pub const DEFAULT_TOOLS: &[&str] = &[
    // recon & scanning
    "nmap",
    "masscan",
    "rustscan",
    "nikto",
    "gobuster",
    "dirb",
    "dirsearch",
    "ffuf",
    "wfuzz",
    "feroxbuster",
    // web
    "sqlmap",
    "nuclei",
    "httpx",
    "whatweb",
    "wafw00f",
    // osint & subdomains
    "subfinder",
    "amass",
    "assetfinder",
    "waybackurls",
    "gau",
    // networking
    "curl",
    "wget",
    "ssh",
    "netcat",
    "nc",
    "ncat",
    "socat",
    // exploitation
    "msfconsole",
    "msfvenom",
    // cracking
    "hashcat",
    "john",
    "hydra",
    "medusa",
    "crackmapexec",
    "netexec",
    // AD / post-exploitation
    "bloodhound",
    "sharphound",
    "mimikatz",
    "rubeus",
    "certipy",
    // scripting
    "python",
    "python3",
    "ruby",
    "perl",
    "php",
    // dns
    "searchsploit",
    "dig",
    "host",
    "nslookup",
    "whois",
    "dnsrecon",
    // smb / ldap / enum
    "enum4linux",
    "smbclient",
    "rpcclient",
    "ldapsearch",
    // traffic
    "tcpdump",
    "tshark",
    "responder",
    // tunneling
    "chisel",
    "ligolo",
    "proxychains",
    // impacket
    "impacket-smbexec",
    "impacket-wmiexec",
    "impacket-psexec",
    "impacket-secretsdump",
    "impacket-getTGT",
    "impacket-GetNPUsers",
    // file transfer
    "scp",
    "rsync",
    "openssl",
    "testssl.sh",
    "certutil",
    // remote access
    "powershell",
    "evil-winrm",
    "xfreerdp",
    "rdesktop",
    "cme",
    // misc
    "kerbrute",
    "gopherus",
    "arjun",
    "paramspider",
];

/// Ordered, case-insensitively unique set of tool names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSet {
    names: Vec<String>,
    lowered: Vec<String>,
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::from_names(DEFAULT_TOOLS.iter().copied())
    }
}

impl ToolSet {
    /// Build a set from names, keeping the first spelling of duplicates.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self {
            names: Vec::new(),
            lowered: Vec::new(),
        };
        for name in names {
            set.push(name.as_ref());
        }
        set
    }

    fn push(&mut self, name: &str) -> bool {
        let lower = name.to_lowercase();
        if self.lowered.contains(&lower) {
            return false;
        }
        self.names.push(name.to_string());
        self.lowered.push(lower);
        true
    }

    /// Parse the line-oriented list format.
    ///
    /// `origin` names the source in warnings. Malformed lines are skipped
    /// and reported; if nothing usable remains the defaults are returned.
    pub fn parse(content: &str, origin: &str) -> (Self, Vec<Warning>) {
        let mut set = Self::from_names(std::iter::empty::<&str>());
        let mut warnings = Vec::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Err(reason) = validate_name(line) {
                warnings.push(Warning::malformed(origin, idx + 1, reason));
                continue;
            }
            if !set.push(line) {
                debug!("{}:{}: duplicate tool '{}' ignored", origin, idx + 1, line);
            }
        }

        if set.is_empty() {
            debug!("{}: no tools listed, using built-in defaults", origin);
            return (Self::default(), warnings);
        }
        (set, warnings)
    }

    /// Load the list from a file. A missing file yields the defaults.
    pub fn load(path: &Path) -> io::Result<(Self, Vec<Warning>)> {
        match fs::read_to_string(path) {
            Ok(content) => {
                let origin = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let (set, warnings) = Self::parse(&content, &origin);
                for w in &warnings {
                    debug!("{}", w);
                }
                Ok((set, warnings))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok((Self::default(), Vec::new())),
            Err(e) => Err(e),
        }
    }

    /// Tool names in configured order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate `(name, lowercase name)` pairs in configured order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .zip(self.lowered.iter())
            .map(|(n, l)| (n.as_str(), l.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lowered.contains(&name.to_lowercase())
    }
}

/// A tool name is a single token of `[A-Za-z0-9._+-]`.
fn validate_name(name: &str) -> Result<(), String> {
    if name.chars().any(char::is_whitespace) {
        return Err(format!("'{}' contains whitespace", name));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-')))
    {
        return Err(format!("'{}' contains invalid character '{}'", name, bad));
    }
    Ok(())
}

/// Write the commented default list to `path`, creating parent directories.
pub fn write_default(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut content = String::from(
        "# oplogger - highlighted security tools\n\
         # One tool name per line. Lines starting with # are ignored.\n\
         # Add your own tools below or remove ones you don't use.\n\n",
    );
    for tool in DEFAULT_TOOLS {
        content.push_str(tool);
        content.push('\n');
    }
    fs::write(path, content)
}

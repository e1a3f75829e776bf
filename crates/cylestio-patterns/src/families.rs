use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// The named regex (and regex-like substring) families held by the registry
/// (§4.2). Each family is a set of independent patterns; a text matches the
/// family if it matches any one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegexFamily {
    SuspiciousShell,
    ShellAccessNetwork,
    McpShellTransition,
    ContextSwitching,
    DangerousHttp,
    SuspiciousSql,
    SqlInjection,
    McpCommandExtraction,
    PrivilegeEscalationCommands,
    SuspiciousDirectories,
    ProcessDangerousCommands,
}

impl RegexFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegexFamily::SuspiciousShell => "suspicious_shell",
            RegexFamily::ShellAccessNetwork => "shell_access_network",
            RegexFamily::McpShellTransition => "mcp_shell_transition",
            RegexFamily::ContextSwitching => "context_switching",
            RegexFamily::DangerousHttp => "dangerous_http",
            RegexFamily::SuspiciousSql => "suspicious_sql",
            RegexFamily::SqlInjection => "sql_injection",
            RegexFamily::McpCommandExtraction => "mcp_command_extraction",
            RegexFamily::PrivilegeEscalationCommands => "privilege_escalation_commands",
            RegexFamily::SuspiciousDirectories => "suspicious_directories",
            RegexFamily::ProcessDangerousCommands => "process_dangerous_commands",
        }
    }

    pub fn all() -> [RegexFamily; 11] {
        [
            RegexFamily::SuspiciousShell,
            RegexFamily::ShellAccessNetwork,
            RegexFamily::McpShellTransition,
            RegexFamily::ContextSwitching,
            RegexFamily::DangerousHttp,
            RegexFamily::SuspiciousSql,
            RegexFamily::SqlInjection,
            RegexFamily::McpCommandExtraction,
            RegexFamily::PrivilegeEscalationCommands,
            RegexFamily::SuspiciousDirectories,
            RegexFamily::ProcessDangerousCommands,
        ]
    }

    /// The compiled patterns for this family, paired with a human-readable
    /// name used as `pattern_name` in scan results.
    pub fn patterns(&self) -> &'static [PatternFamily] {
        match self {
            RegexFamily::SuspiciousShell => &SUSPICIOUS_SHELL,
            RegexFamily::ShellAccessNetwork => &SHELL_ACCESS_NETWORK,
            RegexFamily::McpShellTransition => &MCP_SHELL_TRANSITION,
            RegexFamily::ContextSwitching => &CONTEXT_SWITCHING,
            RegexFamily::DangerousHttp => &DANGEROUS_HTTP,
            RegexFamily::SuspiciousSql => &SUSPICIOUS_SQL,
            RegexFamily::SqlInjection => &SQL_INJECTION,
            RegexFamily::McpCommandExtraction => &MCP_COMMAND_EXTRACTION,
            RegexFamily::PrivilegeEscalationCommands => &PRIVILEGE_ESCALATION_COMMANDS,
            RegexFamily::SuspiciousDirectories => &SUSPICIOUS_DIRECTORIES,
            RegexFamily::ProcessDangerousCommands => &PROCESS_DANGEROUS_COMMANDS,
        }
    }
}

/// One compiled pattern plus the name reported back to callers on a match.
/// `name` is the pattern's own source text unless the original Python table
/// carried a human-readable description (shell_access_network,
/// mcp_shell_transition), in which case that description is used instead.
pub struct PatternFamily {
    pub name: &'static str,
    pub regex: Regex,
}

fn compile(raw: &[(&'static str, &'static str)]) -> Vec<PatternFamily> {
    raw.iter()
        .map(|(name, pat)| PatternFamily {
            name,
            regex: RegexBuilder::new(pat)
                .case_insensitive(true)
                .multi_line(true)
                .build()
                .unwrap_or_else(|e| panic!("invalid built-in pattern {pat:?}: {e}")),
        })
        .collect()
}

macro_rules! family {
    ($static_name:ident, $($pat:expr),+ $(,)?) => {
        static $static_name: LazyLock<Vec<PatternFamily>> =
            LazyLock::new(|| compile(&[$(($pat, $pat)),+]));
    };
}

macro_rules! described_family {
    ($static_name:ident, $(($desc:expr, $pat:expr)),+ $(,)?) => {
        static $static_name: LazyLock<Vec<PatternFamily>> =
            LazyLock::new(|| compile(&[$(($desc, $pat)),+]));
    };
}

// Ported from `security_patterns.py::get_suspicious_shell_patterns`.
family!(
    SUSPICIOUS_SHELL,
    r"(;|\|\||&&|\|)\s*\w+",
    r"(>\s*[\w\/\.]+|>>\s*[\w\/\.]+|<\s*[\w\/\.]+)",
    r"`.*`|\$\(.*\)",
    r"\b(curl|wget|nc|ncat|netcat)\b.*\b(download|http|ftp|tcp)\b",
    r"\b(touch|cat|echo)\b.*\b(/etc/|/tmp/|/var/|C:\\Windows\\|%TEMP%)\b",
    r"\b(curl|wget|nc)\b.*\b([0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}|http://|https://)\b",
    r"(\$[A-Za-z0-9_]+\s*=.*;\s*\$[A-Za-z0-9_]+)",
    r"(base64|hex|eval|exec)\b",
);

// Ported from `security_patterns.py::get_shell_access_network_patterns`.
described_family!(
    SHELL_ACCESS_NETWORK,
    ("Shell command prompt detected in traffic", r"(\$|#|>)\s+(ls|pwd|whoami|id|echo|cat|ps|mkdir|cd)\s"),
    ("Shell id/whoami command response detected", r"uid=\d+\(\w+\)\s+gid=\d+\(\w+\)"),
    ("Directory listing response detected", r"(total\s+\d+\s*\n[-d][-rwx]{9}\s+\d+\s+\w+\s+\w+)"),
    ("Terminal control sequences detected in traffic", "\u{1b}\\[\\d+[mABCDHJKhu]"),
    ("Interactive shell/TTY upgrade attempt detected",
        r#"(python\s+-c\s+['"](import pty; pty\.spawn\(|import tty|exec pty\.spawn)|stty raw -echo|script -q|socat)"#),
    ("System information gathering commands detected",
        r"(uname -a|cat /etc/(passwd|shadow|issue|os-release)|cat /proc/version|hostnamectl|systeminfo|ver\b)"),
    ("Binary data transfer/encoding detected", r"(base64 [-d]|xxd|hexdump|openssl|dd if=)"),
    ("Reverse shell execution pattern detected",
        r"(sh|bash|cmd|powershell|python|perl|ruby|php)\s+(-[ec]|--exec|-i)\s"),
    ("Command history output detected", "(\\d+\\s+\\w+.*\\n\\d+\\s+\\w+.*\\n\\d+\\s+\\w+)"),
    ("Shell session banner detected",
        r"(sh-\d+\.\d+[$#>]|bash-\d+\.\d+[$#>]|Microsoft Windows \[.*\]|Copyright \(c\) \d+ Microsoft Corporation)"),
    ("MCP to shell transition pattern detected",
        r#"(Special username trigger detected|Switching to Shell Command mode|ATTACK MODE ACTIVATED|FORMAT: "[^"]+"\?)"#),
    ("Shell command execution after MCP transition detected",
        r"(All queries are now being executed as shell commands|/bin/sh: [^:]+: command not found)"),
    ("Potential HTTP-based command injection pattern detected",
        r"what is the email of ([a-zA-Z0-9_\-\.]+)\?"),
);

// Ported from `security_patterns.py::get_mcp_shell_transition_patterns`.
described_family!(
    MCP_SHELL_TRANSITION,
    ("MCP shell mode activation trigger detected", r"SWITCH_TO_SHELL_MODE|enable-shell|SHELL_ACCESS_REQUEST"),
    ("Shell command mode transition detected", r"(Switching|Switched) to [Ss]hell [Cc]ommand mode"),
    ("Successful attack mode activation detected", r"ATTACK MODE ACTIVATED|VICTIM HAS BEEN COMPROMISED"),
    ("Shell command execution instructions detected",
        r#"Format: "[^"]+"\?|All queries are now being executed as|executed as shell commands"#),
    ("Disguised shell command pattern detected",
        r"what is the (email|password|username|account) of ([^?]+)\?"),
    ("Shell command error response detected", r"/bin/sh: [^:]+: command not found"),
    ("Directory listing command output detected", r"README\.md\s+__pycache__\s+\w+\.py"),
);

// Ported from `security_patterns.py::get_context_switching_patterns`.
family!(
    CONTEXT_SWITCHING,
    r"enable[_\s]*(shell|command|exec|system)",
    r"(activate|trigger|switch[_\s]*to)[_\s]*(shell|command|exec|system)",
    r"(mode|context)[_\s]*=[_\s]*(shell|command|exec|true|1)",
    r"(set|change|modify)[_\s]*(mode|context|environment|privilege)",
    r"([a-z_]+_){2,}(mode|shell|command|exec|context)",
    r"(s\s*h\s*e\s*l\s*l|c\s*o\s*m\s*m\s*a\s*n\s*d|e\s*x\s*e\s*c)",
    r"(exec|system|shell)[_\s]*(command|call|function)",
    r"(cmd|shell|os|sys|exec)[_\s]*(access|enabled|mode)",
    r"(is|allow|enable)[_\s]*(shell|command|exec)[_\s]*(access|mode)",
);

// Ported from `http_patcher.py::DANGEROUS_HTTP_PATTERNS`.
family!(
    DANGEROUS_HTTP,
    r"bash -i >& /dev/tcp/",
    r#"python -c ['"](import socket|import pty.*pty\.spawn)"#,
    "perl -e 'use Socket;",
    r"rm -f /tmp/f;mkfifo /tmp/f",
    r"nc -e /bin/sh",
    r"base64 -d.*\|.*sh",
    r"eval\(atob\(",
    r"echo.*\|.*base64 -d.*\|.*sh",
    r"IFS=.;.*\$\{IFS\}",
    r"\$\{IEX\}",
    r"String\.fromCharCode\(.*\).+eval",
    r#"system\(['"]/bin/"#,
    r#"exec\(['"]/"#,
    r#"subprocess\.(?:Popen|call|run)\s*\(['"]"#,
);

// Ported from `http_patcher.py::SUSPICIOUS_SQL_PATTERNS`.
family!(
    SUSPICIOUS_SQL,
    r";\s*EXEC\s*",
    r";\s*EXECUTE\s*",
    r";\s*SYSTEM\s*",
    r";\s*SHELL\s*",
    r"--\s*.*SELECT.*INTO\s*OUTFILE",
    r"UNION\s*SELECT.*INTO\s*OUTFILE",
    r#"WHERE\s+\w+\s*=\s*['"].*[|;&`].*['"]"#,
    r"ENABLE.*SHELL",
    r"SWITCH.*MODE.*SHELL",
    r"SET.*MODE.*UNSAFE",
    r#"WHERE\s+\w+\s*=\s*['"].*(\/bin\/sh|\/bin\/bash|cmd\.exe|powershell\.exe).*['"]"#,
);

// Ported from `security_patterns.py::get_sql_injection_patterns`.
family!(
    SQL_INJECTION,
    r#"('|")\s*(OR|AND)\s*('|")\s*=\s*('|")"#,
    r";\s*(DROP|DELETE|UPDATE|INSERT|ALTER)",
    r"UNION\s+(ALL\s+)?SELECT",
    r"--\s+",
    r"#\s*$",
    r"/\*.*\*/",
    r"SLEEP\s*\(\s*\d+\s*\)",
    r"BENCHMARK\s*\(",
    r"WAITFOR\s+DELAY",
    r"INFORMATION_SCHEMA",
    r"LOAD_FILE\s*\(",
    r"INTO\s+OUTFILE",
    r"DUMPFILE",
    r"(EXEC|EXECUTE|CALL|SYSTEM_EXEC|XP_CMDSHELL)(\s*\(|\s+)",
    r"(os\.|sys\.|dbms_).*\.(exec|shell|command|system)",
    r"\{\s*\$where\s*:\s*",
    r"\$ne\s*:",
    r"\$gt\s*:",
    r"\$or\s*:",
);

// Ported from `http_patcher.py::MCP_COMMAND_EXTRACTION_PATTERNS`.
family!(
    MCP_COMMAND_EXTRACTION,
    r#"WHERE\s+\w+\s*=\s*['"](\/bin\/.*?|cmd\.exe.*?|powershell\.exe.*?)['"]"#,
    r#"WHERE\s+\w+\s*=\s*['"](enable\-shell|unsafe\-exec|system\-access)['"]"#,
    r#"WHERE\s+mode\s*=\s*['"](shell|exec|command|unsafe)['"]"#,
);

// Ported from `security_patterns.py::get_privilege_escalation_commands`
// (plain substrings in the original; wrapped as literal regexes here so the
// registry can treat every family uniformly).
family!(
    PRIVILEGE_ESCALATION_COMMANDS,
    "sudo", r"su\s", "pkexec", "doas", "gksudo", "kdesudo", "setuid", "setgid",
    "chown root", r"chmod u\+s", r"chmod \+s", "polkit", "pkcon", "runas", "psexec",
    "nssm", r"sc\s", "at job", "schtasks", "reg add", "CVE-", "pwn", "exploit",
    "dirty_cow", "dirtycow", "linpeas", "linEnum",
);

// Ported from `security_patterns.py::get_suspicious_directories`.
family!(
    SUSPICIOUS_DIRECTORIES,
    "/tmp", "/dev/shm", "/var/tmp", "/run/user", "/run/shm", "/var/run",
    "/proc/self/fd", "/proc/self/maps", "/proc/self/mem",
    "/var/www/html/uploads", "/var/www/tmp", "/srv/www",
    r"\\temp", r"\\tmp", r"\\appdata\\local\\temp",
    r"\\users\\public", r"\\programdata\\temp", r"\\windows\\temp",
    r"\\windows\\system32\\config\\systemprofile\\appdata\\local\\temp",
    r"/\.git", r"/\.svn", r"/\.aws", r"/\.ssh", r"/\.gnupg", "/mnt/c/windows/temp",
);

// Ported from `security_patterns.py::get_dangerous_commands`, consumed by
// `_sensors/process_detection.py::check_suspicious_shell_usage` as a plain
// case-insensitive substring scan over process argv. Distinct from the
// scanner's own small `dangerous_commands` keyword set (§4.2/§4.3) — this
// family exists for process-spawn classification only (§4.7.3).
family!(
    PROCESS_DANGEROUS_COMMANDS,
    "curl", "wget", "nc", "netcat", "ncat", "telnet", "scp", "sftp", "ftp",
    "chmod", "chown", "chattr", "usermod", "visudo", "mkfs", "dd",
    "ssh", "ssh-keygen", "sshd", "rsh", "rexec", "vnc", "rdp",
    "shred", "rm -rf", "rmdir", "srm",
    "nohup", "xargs", "at", "crontab", "watch",
    "pip install", "npm install", "gem install", "apt-get", "apt install", "yum install",
    "perl -e", "python -c", "ruby -e", "php -r", "node -e", "bash -c",
    "bash -i", "perl -e 'use Socket'", "/dev/tcp/", "python -c 'import socket'",
    "memdump", "hexdump", "strings", "gcore", "ptrace", "strace", "ltrace",
    "iptables", "systemctl", "selinux", "firewall-cmd", "launchctl", "netsh",
    "nmap", "masscan", "nikto", "gobuster", "dirb", "dirbuster", "enum4linux",
    "rootkit", "keylogger", "mimikatz", "metasploit", "msfvenom",
);

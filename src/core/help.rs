//! Static help and welcome texts

/// Greeting stored as the first welcome message of a new conversation
pub const WELCOME_MESSAGE: &str =
    "👋 Welcome to Kaz Bot demos! Let me know how I can assist you today.";

/// Reply for `kazbot help!`
pub const COMMANDS_HELP: &str = "💡 Available commands:

📚 Memory Options:
- list memory
- list memory full
- reset memory

🧾 Prompts Options:
- list prompts
- show last N prompts
- show full prompts
- clear prompts

📬 Answers Options:
- list answers
- show last N answers
- show full answers
- clear answers

📤 Export Options:
- export memory as json
- export prompts as json
- export answers as markdown

📈 Analytics:
- show analytics";

/// Full guide, sent as the second welcome message
pub const FULL_HELP: &str = "# KazBot Help

## 🧩 Integration Modules
- `!kazbot command services` - list all available integration modules
- `!kazbot <integration name>` - show the description of one integration

## 🔄 Lifecycle Management
- `!kazbot init <module>` - initialize the module and make it active
- `!kazbot close <module>` - close the module
- `!kazbot status <module>` - show the module status
- `!kazbot restart <module>` - close and init the module
- `!kazbot help <module>` - module specific usage help

## 📦 Session Memory and Analytics
- `list memory` / `list memory full` / `show last <N>` / `reset memory`
- `list prompts` / `show last <N> prompts` / `show full prompts` / `clear prompts`
- `list answers` / `show last <N> answers` / `show full answers` / `clear answers`
- `show analytics` - counters for the whole session
- `!kazbot show session analytics` - usage while integration modules were active

## 📤 Export Features
- `export memory as json` / `export prompts as json` / `export answers as markdown`
- `!kazbot export session answers|memory|prompts` - only what happened while a module was active

## 💬 Fallback
Anything else is answered by the AI. When a module is active, questions about its topics are answered from its live data.";

/// Reply sent instead of internal error details
pub const APOLOGY_MESSAGE: &str = "⚠️ The bot encountered an error. Please try again later.";

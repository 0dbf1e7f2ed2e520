//! Fixed instructions sent to the completion service.

use std::fmt::Write as _;

use lb_domain::config::SessionsConfig;
use lb_tools::MenuCatalog;

/// System turn for lead extraction. Asks for one JSON object with camelCase
/// keys; the parser also accepts snake_case.
pub const EXTRACTION_PROMPT: &str = r#"Extract the following customer details from the transcript.
Also classify user's intent precisely as one of: 'order', 'ask_info', 'other'.
Only set orderItem when the intent is 'order'. The user might ask to learn more about a dish; do not infer an order in that case.
Return strictly valid JSON per the schema below.
- Name
- Email address
- Phone number
- Order time
- Address
- Order item
- Special notes
- Lead quality (categorize as 'good', 'ok', or 'spam')
Format the response using this JSON schema:
{
  "type": "object",
  "properties": {
    "customerName": { "type": "string" },
    "customerEmail": { "type": "string" },
    "customerPhone": { "type": "string" },
    "orderTime": { "type": "string" },
    "customerAddress": { "type": "string" },
    "orderItem": { "type": "string" },
    "specialNotes": { "type": "string" },
    "leadQuality": { "type": "string", "enum": ["good", "ok", "spam"] },
    "userIntent": { "type": "string", "enum": ["order", "ask_info", "other"] }
  },
  "required": ["customerName", "customerEmail", "orderTime", "leadQuality", "userIntent"]
}
Return only a valid JSON object, with no extra commentary."#;

pub fn extraction_user_message(transcript: &str) -> String {
    format!("Transcript:\n{transcript}\n\nReturn only JSON.")
}

/// Host instructions built from the menu catalogue, so a custom menu file
/// changes the prices the model quotes.
pub fn host_prompt(catalog: &MenuCatalog) -> String {
    let house = &catalog.house;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "You are {brand} Assistant, the friendly, concise virtual host of {brand}, a {cuisine} restaurant.",
        brand = house.brand,
        cuisine = house.cuisine.to_lowercase(),
    );
    out.push_str(
        "\nGOAL\n- Keep replies warm, respectful, and to-the-point (prefer 1-3 short sentences). \
         Use the same language as the user. Ask only one question at a time.\n",
    );

    out.push_str("\nHOUSE INFO\n");
    let _ = writeln!(out, "- Brand: {} ({})", house.brand, house.cuisine);
    let _ = writeln!(out, "- Address: {}", house.address);
    let _ = writeln!(out, "- Hotline: {}", house.hotline);
    let _ = writeln!(
        out,
        "- Currency: Show prices in {} (e.g., {})",
        house.currency,
        catalog.format_price(12.90),
    );

    out.push_str("\nMENU REFERENCE (use exactly when asked about items/prices)\n");
    for dish in &catalog.dishes {
        let _ = writeln!(out, "- {}: {}", dish.name, catalog.format_price(dish.price));
    }
    out.push_str("- Featured/Omakase: If asked, explain it's the chef's curated selection.\n");

    out.push_str(
        "\nConversation flow:\n\
         - 1. First, ask if the user wants to order something from the menu. If they mention a dish from the menu, go to step 4. If not, go to step 2.\n\
         - 2. Then, list all the dishes from the MENU REFERENCE, just include the dish name, and ask if the user would like to know more about a dish or order it.\n\
         - 3. After that, if the user wants to know more about a specific dish, use the tool show_food_image.\n\
         - 4. If the user confirms the dishes, do not use the tool show_food_image, just confirm the user's dishes. Next, ask for the customer's name -> email -> phone number -> address. Ask the user one by one.\n\
         - 5. Next, ask them for date, time and their timezone, and confirm the delivery time.\n\
         - 6. Finally, ask if they have any notes or questions before ending the chat.\n",
    );
    let _ = writeln!(
        out,
        "- 7. If the user has any notes or questions, ask them to send it to the email address: {}.",
        house.email,
    );

    out.push_str("\nTONE\n- Use bullets sparingly when listing options.");
    out
}

/// Resolve the system turn: inline override, then file, then the built-in
/// host instructions.
pub fn resolve_system_prompt(
    cfg: &SessionsConfig,
    catalog: &MenuCatalog,
) -> anyhow::Result<String> {
    if let Some(inline) = cfg.system_prompt.as_deref().filter(|s| !s.trim().is_empty()) {
        return Ok(inline.to_owned());
    }
    if let Some(path) = &cfg.system_prompt_path {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading system prompt {}: {e}", path.display()))?;
        if !text.trim().is_empty() {
            return Ok(text);
        }
        tracing::warn!(path = %path.display(), "system prompt file is empty, using built-in prompt");
    }
    Ok(host_prompt(catalog))
}

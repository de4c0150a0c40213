use anyhow::Result;
use std::io::{self, Write};
use switchboard_shared::RoutedResponse;

use crate::client::ApiClient;

pub fn render(response: &RoutedResponse) -> String {
    format!("[{}] {}", response.tool_used, response.result)
}

async fn ask(client: &ApiClient, query: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", client.query_raw(query).await?);
    } else {
        println!("{}", render(&client.query(query).await?));
    }
    Ok(())
}

pub async fn single_query(client: &ApiClient, query: &str, json: bool) -> Result<()> {
    if let Err(e) = ask(client, query, json).await {
        eprintln!("Error: {:#}", e);
        eprintln!("Is the Switchboard router running?");
        return Err(e);
    }
    Ok(())
}

pub async fn interactive_chat(client: &ApiClient, json: bool) -> Result<()> {
    match client.health().await {
        Ok(message) => log::info!("{}", message),
        Err(e) => log::warn!("Health check failed: {}", e),
    }

    println!("Envoy chat started. Type 'quit' to exit.\n");

    loop {
        print!("You: ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("quit") {
            println!("Goodbye!");
            break;
        }

        if input.is_empty() {
            continue;
        }

        if let Err(e) = ask(client, input, json).await {
            eprintln!("Error: {:#}", e);
        }
        println!();
    }

    Ok(())
}

pub async fn list_tools(client: &ApiClient, json: bool) -> Result<()> {
    let tools = client.tools().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }
    for tool in tools {
        println!("{:<8} {}", tool.name, tool.description);
    }
    Ok(())
}

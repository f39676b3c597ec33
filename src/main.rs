//! # Docpress CLI
//!
//! Usage:
//!   docpress input.json -o output.pdf
//!   echo '{ ... }' | docpress -o output.pdf
//!   docpress --example > invoice.json

use std::env;
use std::fs;
use std::io::{self, Read};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    // Handle --example flag
    if args.iter().any(|a| a == "--example") {
        print!("{}", example_invoice_json());
        return;
    }

    // Read input
    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1]).expect("Failed to read input file")
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).expect("Failed to read stdin");
        buf
    };

    // Parse output path
    let output_path = args
        .windows(2)
        .find(|w| w[0] == "-o")
        .map(|w| w[1].clone())
        .unwrap_or_else(|| "output.pdf".to_string());

    // Render
    match docpress::render_json(&input) {
        Ok(pdf_bytes) => {
            fs::write(&output_path, &pdf_bytes).expect("Failed to write PDF");
            eprintln!("✓ Written {} bytes to {}", pdf_bytes.len(), output_path);
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    }
}

fn example_invoice_json() -> &'static str {
    r##"{
  "documentType": "invoice",
  "context": {
    "invoiceNumber": "INV-2026-001",
    "issuedAt": "2026-08-30",
    "company": {
      "name": "Acme Field Services Ltd",
      "address": "123 Business St, Suite 100, Springfield"
    },
    "customer": {
      "name": "Widget Industries",
      "address": "456 Industrial Way, Springfield"
    },
    "items": [
      { "description": "Boiler service and inspection", "quantity": 1, "unitPrice": "120.00", "lineTotal": "120.00" },
      { "description": "Replacement thermostat", "quantity": 2, "unitPrice": "45.00", "lineTotal": "90.00" },
      { "description": "Labour (additional hours)", "quantity": 3, "unitPrice": "60.00", "lineTotal": "180.00" }
    ],
    "totals": {
      "subtotal": "390.00",
      "tax": "78.00",
      "total": "468.00"
    },
    "paymentTerms": "Payment due within 14 days of invoice date."
  }
}
"##
}

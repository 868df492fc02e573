use LinkedQueueMini::core::config::RegistryConfig;
use LinkedQueueMini::core::error::QueueError;
use LinkedQueueMini::core::registry::QueueRegistry;

fn main() {
    let outcome = QueueRegistry::scope(RegistryConfig::default(), |registry| {
        let queue = match registry.create() {
            Ok(queue) => queue,
            Err(e) => {
                println!("Failed to create queue: {}", e);
                return None;
            }
        };

        // Adding elements
        for value in [10, 20, 30] {
            if let Err(e) = queue.push(value) {
                println!("Failed to push {}: {}", value, e);
                return None;
            }
        }
        println!("Queue contents: {}", queue.debug_dump());

        if let Ok(front) = queue.peek() {
            println!("Front element: {}", front);
        }

        // Remove element and print updated queue
        if let Ok(value) = queue.pop() {
            println!("Popped: {}", value);
        }
        println!("After pop: {}", queue.debug_dump());

        println!("Queue is {}", if queue.is_empty() { "empty" } else { "not empty" });

        for search_value in [20, 99] {
            match queue.search(search_value) {
                Ok(position) => println!("Element {} found at position {}", search_value, position),
                Err(QueueError::NotFound { .. }) => println!("Element {} not found in queue", search_value),
                Err(e) => println!("Search failed: {}", e),
            }
        }

        println!("Queue size: {}", queue.size());

        queue.free();

        // Hand a second, unfreed queue back out so the sweep has work to do
        let leftover = registry.create().ok()?;
        leftover.push(42).ok()?;
        Some(leftover)
    });

    match outcome {
        Ok((leftover, report)) => {
            println!(
                "Sweep released {} queue(s), {} node(s), cleared {} slot(s)",
                report.queues_released, report.nodes_released, report.slots_cleared
            );
            if let Some(queue) = leftover {
                println!("Leftover queue {} released: {}", queue.index(), queue.is_released());
            }
        }
        Err(e) => eprintln!("Invalid registry config: {}", e),
    }
}
